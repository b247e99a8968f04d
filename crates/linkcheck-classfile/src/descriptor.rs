//! JVM descriptor grammar: field descriptors, method descriptors, and the
//! array/primitive unwrapping rules used by symbol extraction.
//!
//! Grammar (JVMS 4.3):
//! ```text
//! FieldDescriptor  := BaseType | ObjectType | ArrayType
//! BaseType         := B | C | D | F | I | J | S | Z
//! ObjectType       := 'L' ClassName ';'
//! ArrayType        := '[' ComponentType
//! MethodDescriptor := '(' ParamDescriptor* ')' ReturnDescriptor
//! ReturnDescriptor := FieldDescriptor | 'V'
//! ```

/// Unwraps a constant-pool `Class` entry's name to the internal class name
/// it denotes, discarding primitive array element types.
///
/// `"java/lang/String"` -> `Some("java/lang/String")`
/// `"[Ljava/lang/String;"` -> `Some("java/lang/String")`
/// `"[I"` -> `None` (primitive array, no owner class)
pub fn unwrap_to_class_name(raw: &str) -> Option<String> {
    let inner = raw.trim_start_matches('[');
    if inner.is_empty() {
        return None;
    }
    if let Some(name) = inner.strip_prefix('L').and_then(|s| s.strip_suffix(';')) {
        if name.is_empty() {
            return None;
        }
        return Some(name.to_string());
    }
    if raw.starts_with('[') {
        // Primitive array element, e.g. "[I", "[[D".
        return None;
    }
    // A bare class-constant entry always names a class directly.
    Some(raw.to_string())
}

/// Splits a method descriptor `"(IILjava/lang/String;)V"` into parameter
/// descriptors and a return descriptor. Returns `None` if the descriptor is
/// not well-formed (missing parens, truncated type).
pub fn split_method_descriptor(descriptor: &str) -> Option<(Vec<String>, String)> {
    let body = descriptor.strip_prefix('(')?;
    let close = body.find(')')?;
    let (params_str, rest) = body.split_at(close);
    let return_desc = &rest[1..];
    let params = parse_descriptor_sequence(params_str)?;
    if !is_valid_field_or_void(return_desc) {
        return None;
    }
    Some((params, return_desc.to_string()))
}

/// Returns true if `descriptor` is a well-formed field descriptor (not `V`).
pub fn is_valid_field_descriptor(descriptor: &str) -> bool {
    parse_one_descriptor(descriptor)
        .map(|(_, rest)| rest.is_empty())
        .unwrap_or(false)
}

fn is_valid_field_or_void(descriptor: &str) -> bool {
    descriptor == "V" || is_valid_field_descriptor(descriptor)
}

fn parse_descriptor_sequence(input: &str) -> Option<Vec<String>> {
    let mut rest = input;
    let mut out = Vec::new();
    while !rest.is_empty() {
        let (desc, remainder) = parse_one_descriptor(rest)?;
        out.push(desc);
        rest = remainder;
    }
    Some(out)
}

/// Parses a single field descriptor from the front of `input`, returning it
/// and the unconsumed remainder.
fn parse_one_descriptor(input: &str) -> Option<(String, &str)> {
    let mut chars = input.char_indices();
    let (_, first) = chars.next()?;
    match first {
        'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' => Some((first.to_string(), &input[1..])),
        '[' => {
            let (_, rest) = parse_one_descriptor(&input[1..])?;
            let consumed = input.len() - rest.len();
            Some((input[..consumed].to_string(), rest))
        }
        'L' => {
            let end = input.find(';')?;
            Some((input[..=end].to_string(), &input[end + 1..]))
        }
        _ => None,
    }
}
