//! Enumerates a class file's outbound symbolic references.

use std::collections::BTreeSet;

use classfile_parser::constant_info::ConstantInfo;
use linkcheck_util::errors::LinkcheckError;

use crate::descriptor::unwrap_to_class_name;
use crate::reader::{self, ClassFile};
use crate::symbol::{ClassSymbol, FieldSymbol, MethodSymbol, Reference, Symbol};

/// Parses `data` and extracts every outbound reference it makes, tagged
/// with the parsed class as referrer.
///
/// - every `Class` constant-pool entry that isn't the class itself becomes
///   a `ClassSymbol` (array descriptors unwrapped to their element class,
///   primitive array owners discarded); the entry at the `super_class`
///   slot additionally carries the super-declaration marker.
/// - every `Fieldref`/`Methodref`/`InterfaceMethodref` becomes a
///   `FieldSymbol`/`MethodSymbol`.
/// - `InnerClasses` outer-class entries are emitted as `ClassSymbol`s.
/// - `(symbol, source class)` pairs are deduplicated within the class file.
pub fn extract_symbols(data: &[u8]) -> Result<(ClassFile, Vec<Reference>), LinkcheckError> {
    let (class, pool) = reader::parse_with_pool(data)?;
    let refs = extract_from_pool(&class, &pool);
    Ok((class, refs))
}

/// Extracts references given an already-parsed [`ClassFile`] plus its raw
/// constant pool, for callers (the class repository) that keep the pool
/// around across a single lazy-parse.
pub(crate) fn extract_from_pool(class: &ClassFile, pool: &[ConstantInfo]) -> Vec<Reference> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    let emit = |symbol: Symbol, seen: &mut BTreeSet<(u8, String, String, String, bool)>, out: &mut Vec<Reference>| {
        let key = dedup_key(&symbol);
        if seen.insert(key) {
            out.push(Reference {
                source_class: class.internal_name.clone(),
                symbol,
            });
        }
    };

    let super_class_index = class
        .super_name
        .as_ref()
        .and_then(|name| find_class_pool_index(pool, name));

    for (zero_based_idx, entry) in pool.iter().enumerate() {
        let pool_index = (zero_based_idx + 1) as u16;
        match entry {
            ConstantInfo::Class(c) => {
                let Ok(raw_name) = reader::resolve_utf8(pool, c.name_index) else {
                    continue;
                };
                let Some(owner) = unwrap_to_class_name(&raw_name) else {
                    continue;
                };
                if owner == class.internal_name {
                    continue;
                }
                let via_super = super_class_index == Some(pool_index);
                emit(Symbol::Class(ClassSymbol { owner, via_super }), &mut seen, &mut out);
            }
            ConstantInfo::FieldRef(f) => {
                if let (Ok(owner), Ok((name, descriptor))) = (
                    reader::resolve_class_name(pool, f.class_index),
                    resolve_name_and_type(pool, f.name_and_type_index),
                ) {
                    emit(
                        Symbol::Field(FieldSymbol { owner, name, descriptor }),
                        &mut seen,
                        &mut out,
                    );
                }
            }
            ConstantInfo::MethodRef(m) => {
                if let (Ok(owner), Ok((name, descriptor))) = (
                    reader::resolve_class_name(pool, m.class_index),
                    resolve_name_and_type(pool, m.name_and_type_index),
                ) {
                    emit(
                        Symbol::Method(MethodSymbol { owner, name, descriptor, interface: false }),
                        &mut seen,
                        &mut out,
                    );
                }
            }
            ConstantInfo::InterfaceMethodRef(m) => {
                if let (Ok(owner), Ok((name, descriptor))) = (
                    reader::resolve_class_name(pool, m.class_index),
                    resolve_name_and_type(pool, m.name_and_type_index),
                ) {
                    emit(
                        Symbol::Method(MethodSymbol { owner, name, descriptor, interface: true }),
                        &mut seen,
                        &mut out,
                    );
                }
            }
            _ => {}
        }
    }

    for outer in &class.inner_class_outers {
        if outer != &class.internal_name {
            emit(
                Symbol::Class(ClassSymbol { owner: outer.clone(), via_super: false }),
                &mut seen,
                &mut out,
            );
        }
    }

    out
}

fn dedup_key(symbol: &Symbol) -> (u8, String, String, String, bool) {
    match symbol {
        Symbol::Class(c) => (0, c.owner.clone(), String::new(), String::new(), c.via_super),
        Symbol::Method(m) => (1, m.owner.clone(), m.name.clone(), m.descriptor.clone(), m.interface),
        Symbol::Field(f) => (2, f.owner.clone(), f.name.clone(), f.descriptor.clone(), false),
    }
}

fn find_class_pool_index(pool: &[ConstantInfo], internal_name: &str) -> Option<u16> {
    pool.iter().enumerate().find_map(|(i, entry)| match entry {
        ConstantInfo::Class(c) => {
            let name = reader::resolve_utf8(pool, c.name_index).ok()?;
            (name == internal_name).then_some((i + 1) as u16)
        }
        _ => None,
    })
}

fn resolve_name_and_type(pool: &[ConstantInfo], index: u16) -> Result<(String, String), String> {
    match pool.get(index.wrapping_sub(1) as usize) {
        Some(ConstantInfo::NameAndType(nat)) => Ok((
            reader::resolve_utf8(pool, nat.name_index)?,
            reader::resolve_utf8(pool, nat.descriptor_index)?,
        )),
        Some(_) => Err(format!("constant pool index {index} is not NameAndType")),
        None => Err(format!("constant pool index {index} out of bounds")),
    }
}
