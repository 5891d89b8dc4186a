//! Renders the companion source artifact: a class of code point constants,
//! one per icon.

use std::fmt::Write as _;

/// Render the constants class.
///
/// Constant names are the icon names uppercased with non-alphanumerics
/// folded to underscores; a leading digit gets an underscore prefix.
pub fn render(class_name: &str, indent: usize, code_points: &[(String, u32)]) -> String {
    let pad = " ".repeat(indent);

    let mut out = String::new();
    out.push_str("// Generated file. Do not edit.\n");
    let _ = writeln!(out, "class {class_name} {{");
    for (name, code_point) in code_points {
        let _ = writeln!(
            out,
            "{pad}static final int {} = 0x{code_point:04X};",
            constant_name(name)
        );
    }
    out.push_str("}\n");
    out
}

fn constant_name(name: &str) -> String {
    let mut constant: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();

    if constant.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        constant.insert(0, '_');
    }

    constant
}
