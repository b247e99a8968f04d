//! Component D: parses class file bytes into the domain [`ClassFile`] model.
//!
//! Built on the `classfile-parser` crate's nom-based parser. That crate
//! hands back raw constant-pool, field, method, and attribute structures;
//! this module resolves indices into names and descriptors and discards
//! everything the checker doesn't need (bytecode, stack maps, signatures).

use classfile_parser::attribute_info::AttributeInfo;
use classfile_parser::constant_info::ConstantInfo;
pub use classfile_parser::field_info::FieldAccessFlags;
pub use classfile_parser::method_info::MethodAccessFlags;
pub use classfile_parser::types::ClassAccessFlags;
use classfile_parser::types::ClassFile as RawClassFile;
use linkcheck_util::errors::LinkcheckError;

/// Highest class file major version this reader understands the constant
/// pool tag set of. Java 21 (major 65); newer tag kinds (`Dynamic`,
/// `Module`, `Package` - majors 53+ in principle, but only emitted by
/// module-info classes and some newer bytecode) aren't modeled by the
/// underlying parser and are reported as [`LinkcheckError::UnsupportedClassFileVersion`].
pub const MAX_SUPPORTED_MAJOR_VERSION: u16 = 65;

/// A parsed class file: internal name, flags, hierarchy, and members.
/// Opaque after this point - bytecode and attributes beyond what symbol
/// extraction needs are discarded.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub internal_name: String,
    pub major_version: u16,
    pub minor_version: u16,
    pub access_flags: ClassAccessFlags,
    /// `None` only for `java/lang/Object`, the root of the hierarchy.
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldMember>,
    pub methods: Vec<MethodMember>,
    /// Outer-class references recovered from the `InnerClasses` attribute,
    /// kept separate from the generic constant-pool walk so the symbol
    /// extractor can emit them explicitly per spec.
    pub inner_class_outers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FieldMember {
    pub name: String,
    pub descriptor: String,
    pub access_flags: FieldAccessFlags,
}

#[derive(Debug, Clone)]
pub struct MethodMember {
    pub name: String,
    pub descriptor: String,
    pub access_flags: MethodAccessFlags,
}

impl ClassFile {
    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::ABSTRACT)
    }

    /// Java package of this class, derived from its internal name
    /// (`"a/b/C"` -> `"a/b"`; unnamed package -> `""`).
    pub fn package(&self) -> &str {
        match self.internal_name.rfind('/') {
            Some(idx) => &self.internal_name[..idx],
            None => "",
        }
    }
}

/// Parses raw class file bytes into a [`ClassFile`].
///
/// Distinguishes two non-fatal failure kinds per the error taxonomy:
/// a version newer than [`MAX_SUPPORTED_MAJOR_VERSION`] is
/// `UnsupportedClassFileVersion`; anything else that fails to parse
/// (bad magic, truncated stream, unrecognized constant-pool tag) is
/// `MalformedClassFile`.
pub fn parse_class_bytes(data: &[u8]) -> Result<ClassFile, LinkcheckError> {
    parse_with_pool(data).map(|(class, _pool)| class)
}

/// Parses class file bytes, returning both the domain [`ClassFile`] and the
/// raw constant pool. The constant pool is opaque to callers of
/// [`parse_class_bytes`]; the symbol extractor (`crate::extractor`) is the
/// only other consumer, since symbol extraction needs a second walk over
/// the same pool the reader already parsed.
pub(crate) fn parse_with_pool(
    data: &[u8],
) -> Result<(ClassFile, Vec<ConstantInfo>), LinkcheckError> {
    if data.len() < 10 || data[0..4] != [0xCA, 0xFE, 0xBA, 0xBE] {
        return Err(LinkcheckError::MalformedClassFile {
            class_name: "<unknown>".to_string(),
            message: "bad magic number".to_string(),
        });
    }
    let major_version = u16::from_be_bytes([data[6], data[7]]);
    if major_version > MAX_SUPPORTED_MAJOR_VERSION {
        return Err(LinkcheckError::UnsupportedClassFileVersion {
            class_name: "<unknown>".to_string(),
            major: major_version,
        });
    }

    let (_, raw) = classfile_parser::parser::class_parser(data).map_err(|e| {
        LinkcheckError::MalformedClassFile {
            class_name: "<unknown>".to_string(),
            message: format!("{e}"),
        }
    })?;

    let pool = raw.const_pool.clone();
    let class = parse_raw(raw)?;
    Ok((class, pool))
}

fn parse_raw(raw: RawClassFile) -> Result<ClassFile, LinkcheckError> {
    let pool = &raw.const_pool;
    let internal_name = resolve_class_name(pool, raw.this_class).map_err(|message| {
        LinkcheckError::MalformedClassFile {
            class_name: "<unknown>".to_string(),
            message,
        }
    })?;

    let malformed = |message: String| LinkcheckError::MalformedClassFile {
        class_name: internal_name.clone(),
        message,
    };

    if raw.major_version > MAX_SUPPORTED_MAJOR_VERSION {
        return Err(LinkcheckError::UnsupportedClassFileVersion {
            class_name: internal_name,
            major: raw.major_version,
        });
    }

    let super_name = if raw.super_class == 0 {
        None
    } else {
        Some(resolve_class_name(pool, raw.super_class).map_err(malformed)?)
    };

    let mut interfaces = Vec::with_capacity(raw.interfaces.len());
    for idx in &raw.interfaces {
        interfaces.push(resolve_class_name(pool, *idx).map_err(malformed)?);
    }

    let mut fields = Vec::with_capacity(raw.fields.len());
    for f in &raw.fields {
        fields.push(FieldMember {
            name: resolve_utf8(pool, f.name_index).map_err(malformed)?,
            descriptor: resolve_utf8(pool, f.descriptor_index).map_err(malformed)?,
            access_flags: f.access_flags,
        });
    }

    let mut methods = Vec::with_capacity(raw.methods.len());
    for m in &raw.methods {
        methods.push(MethodMember {
            name: resolve_utf8(pool, m.name_index).map_err(malformed)?,
            descriptor: resolve_utf8(pool, m.descriptor_index).map_err(malformed)?,
            access_flags: m.access_flags,
        });
    }

    let inner_class_outers = parse_inner_classes(pool, &raw.attributes).map_err(malformed)?;

    Ok(ClassFile {
        internal_name,
        major_version: raw.major_version,
        minor_version: raw.minor_version,
        access_flags: raw.access_flags,
        super_name,
        interfaces,
        fields,
        methods,
        inner_class_outers,
    })
}

/// Resolves a `CONSTANT_Utf8` entry at 1-based constant-pool `index`.
pub(crate) fn resolve_utf8(pool: &[ConstantInfo], index: u16) -> Result<String, String> {
    match pool.get(index.wrapping_sub(1) as usize) {
        Some(ConstantInfo::Utf8(u)) => Ok(u.utf8_string.clone()),
        Some(_) => Err(format!("constant pool index {index} is not Utf8")),
        None => Err(format!("constant pool index {index} out of bounds")),
    }
}

/// Resolves a `CONSTANT_Class` entry at 1-based constant-pool `index` to its
/// internal name string.
pub(crate) fn resolve_class_name(pool: &[ConstantInfo], index: u16) -> Result<String, String> {
    match pool.get(index.wrapping_sub(1) as usize) {
        Some(ConstantInfo::Class(c)) => resolve_utf8(pool, c.name_index),
        Some(_) => Err(format!("constant pool index {index} is not a Class entry")),
        None => Err(format!("constant pool index {index} out of bounds")),
    }
}

/// Decodes the `InnerClasses` attribute (JVMS 4.7.6) from its raw bytes,
/// returning the internal names of outer classes referenced by any inner
/// class entry. `classfile-parser` surfaces attributes only as
/// name-index + raw bytes, so this is hand-rolled, mirroring how
/// `exoego-inspequte`'s scan pass walks constant-pool entries after a
/// third-party parse.
fn parse_inner_classes(
    pool: &[ConstantInfo],
    attributes: &[AttributeInfo],
) -> Result<Vec<String>, String> {
    let mut outers = Vec::new();
    for attr in attributes {
        let name = resolve_utf8(pool, attr.attribute_name_index)?;
        if name != "InnerClasses" {
            continue;
        }
        let info = &attr.info;
        if info.len() < 2 {
            return Err("truncated InnerClasses attribute".to_string());
        }
        let count = u16::from_be_bytes([info[0], info[1]]) as usize;
        let mut offset = 2usize;
        for _ in 0..count {
            if offset + 8 > info.len() {
                return Err("truncated InnerClasses entry".to_string());
            }
            let outer_class_info_index = u16::from_be_bytes([info[offset + 2], info[offset + 3]]);
            if outer_class_info_index != 0 {
                outers.push(resolve_class_name(pool, outer_class_info_index)?);
            }
            offset += 8;
        }
    }
    Ok(outers)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Arbitrary bytes must never panic the reader - only `Ok` for a
        /// well-formed class or `Err(MalformedClassFile)`/`Err(Unsupported...)`.
        #[test]
        fn parse_class_bytes_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = parse_class_bytes(&data);
        }

        /// Any buffer not starting with the class file magic number is
        /// rejected as malformed rather than accepted or panicking.
        #[test]
        fn non_magic_prefix_is_always_malformed(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            prop_assume!(data.len() < 4 || data[0..4] != [0xCA, 0xFE, 0xBA, 0xBE]);
            prop_assert!(parse_class_bytes(&data).is_err());
        }
    }
}
