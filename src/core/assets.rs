//! Embedded templates.
//!
//! The canonical guide, the compliance manifest template and the default
//! configuration are baked into the binary so `orgpolicy init` works with no
//! external files.

/// Embed template files at compile time as text.
///
/// Generates:
/// - Public constants for each embedded template
/// - `get_template(name)` function for lookup
/// - `list_templates()` function for discovery
macro_rules! embedded_templates {
    ($($path:expr => $const_name:ident),* $(,)?) => {
        $(
            pub const $const_name: &str =
                include_str!(concat!("../../templates/", $path));
        )*

        pub fn get_template(name: &str) -> Option<&'static str> {
            match name {
                $( $path => Some($const_name), )*
                _ => None,
            }
        }

        pub fn list_templates() -> Vec<&'static str> {
            vec![ $( $path, )* ]
        }
    };
}

embedded_templates! {
    "MULTI_DOCUMENT_ENTERPRISE_CODING_PRINCIPLES_GUIDE.md" => TEMPLATE_GUIDE,
    "compliance.json" => TEMPLATE_COMPLIANCE,
    "orgpolicy.toml" => TEMPLATE_CONFIG,
}

/// Closer line that ends the embedded guide.
pub const GUIDE_CLOSER: &str = "<!-- END OF DOCUMENT -->";

/// Manifest template with placeholders filled in.
pub fn render_compliance(project: &str, run_id: &str) -> String {
    let escape = |s: &str| {
        serde_json::to_string(s)
            .map(|quoted| quoted[1..quoted.len() - 1].to_string())
            .unwrap_or_default()
    };
    TEMPLATE_COMPLIANCE
        .replace("{{project}}", &escape(project))
        .replace("{{run_id}}", &escape(run_id))
}
