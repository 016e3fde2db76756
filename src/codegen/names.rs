// twirp-godot/src/codegen/names.rs

/// Identifiers that would clash with GDScript keywords, builtin types or the
/// parameter names used by the generated map mutators.
pub const GDSCRIPT_RESERVED: &[&str] = &[
    "func", "if", "match", "range", "name", "value", "bool", "int", "float", "String",
    "PackedByteArray",
];

/// Prefix applied to every generated member variable.
pub const FIELD_PREFIX: &str = "f_";

pub fn is_reserved(name: &str) -> bool {
    GDSCRIPT_RESERVED.contains(&name)
}

/// Convert a qualified schema name into a GDScript class name.
/// "shop.v1.Item" -> "shop_v1_Item"
pub fn class_name(full_name: &str) -> String {
    full_name.replace('.', "_")
}

pub fn field_identifier(name: &str) -> String {
    format!("{FIELD_PREFIX}{name}")
}

/// Render `text` as a double-quoted GDScript string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
