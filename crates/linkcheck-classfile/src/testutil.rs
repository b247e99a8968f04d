//! Synthesized class file construction for tests.
//!
//! Real JARs aren't available in this workspace, so boundary scenarios
//! (missing method, dependency conflict, abstract-unimplemented, ...) are
//! built by hand-assembling minimal, valid class file byte streams. Not
//! gated behind `#[cfg(test)]` so sibling crates (`linkcheck-classpath`,
//! `linkcheck-linker`) can reuse it from their own test suites.

/// Builds well-formed JVM class file bytes for test fixtures.
#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    this_name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<(String, String, u16)>,
    methods: Vec<(String, String, u16)>,
    extra_class_refs: Vec<String>,
    field_refs: Vec<(String, String, String)>,
    method_refs: Vec<(String, String, String, bool)>,
    inner_class_outers: Vec<String>,
    access_flags: u16,
    major_version: u16,
}

const ACC_PUBLIC: u16 = 0x0001;
const ACC_SUPER: u16 = 0x0020;
const ACC_INTERFACE: u16 = 0x0200;
const ACC_ABSTRACT: u16 = 0x0400;

impl ClassFileBuilder {
    /// A class `name` extending `super_name`.
    pub fn new(name: &str, super_name: &str) -> Self {
        Self {
            this_name: name.to_string(),
            super_name: Some(super_name.to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            extra_class_refs: Vec::new(),
            field_refs: Vec::new(),
            method_refs: Vec::new(),
            inner_class_outers: Vec::new(),
            access_flags: ACC_PUBLIC | ACC_SUPER,
            major_version: 52,
        }
    }

    /// The root of the hierarchy: a class with no super class.
    pub fn root(name: &str) -> Self {
        Self {
            this_name: name.to_string(),
            super_name: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            extra_class_refs: Vec::new(),
            field_refs: Vec::new(),
            method_refs: Vec::new(),
            inner_class_outers: Vec::new(),
            access_flags: ACC_PUBLIC | ACC_SUPER,
            major_version: 52,
        }
    }

    /// An interface named `name`, optionally extending superinterfaces.
    pub fn interface(name: &str) -> Self {
        Self {
            this_name: name.to_string(),
            super_name: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            extra_class_refs: Vec::new(),
            field_refs: Vec::new(),
            method_refs: Vec::new(),
            inner_class_outers: Vec::new(),
            access_flags: ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT,
            major_version: 52,
        }
    }

    pub fn abstract_class(mut self) -> Self {
        self.access_flags |= ACC_ABSTRACT;
        self
    }

    pub fn with_interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn with_field(mut self, name: &str, descriptor: &str, access_flags: u16) -> Self {
        self.fields.push((name.to_string(), descriptor.to_string(), access_flags));
        self
    }

    pub fn with_method(mut self, name: &str, descriptor: &str, access_flags: u16) -> Self {
        self.methods.push((name.to_string(), descriptor.to_string(), access_flags));
        self
    }

    /// Adds a bare `CONSTANT_Class` reference to the constant pool, as if
    /// some method body referenced `class_name` (e.g. `new`, `checkcast`).
    pub fn with_class_ref(mut self, class_name: &str) -> Self {
        self.extra_class_refs.push(class_name.to_string());
        self
    }

    pub fn with_field_ref(mut self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.field_refs
            .push((owner.to_string(), name.to_string(), descriptor.to_string()));
        self
    }

    pub fn with_method_ref(mut self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.method_refs
            .push((owner.to_string(), name.to_string(), descriptor.to_string(), false));
        self
    }

    pub fn with_interface_method_ref(mut self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.method_refs
            .push((owner.to_string(), name.to_string(), descriptor.to_string(), true));
        self
    }

    pub fn with_inner_class_outer(mut self, outer_name: &str) -> Self {
        self.inner_class_outers.push(outer_name.to_string());
        self
    }

    pub fn with_major_version(mut self, major: u16) -> Self {
        self.major_version = major;
        self
    }

    /// Serializes the builder into a complete class file byte stream.
    pub fn build(self) -> Vec<u8> {
        let mut pool = ConstantPoolWriter::new();
        let this_idx = pool.add_class(&self.this_name);
        let super_idx = self.super_name.as_deref().map(|s| pool.add_class(s)).unwrap_or(0);
        let interface_idxs: Vec<u16> = self.interfaces.iter().map(|i| pool.add_class(i)).collect();

        for c in &self.extra_class_refs {
            pool.add_class(c);
        }
        for (owner, name, descriptor) in &self.field_refs {
            pool.add_fieldref(owner, name, descriptor);
        }
        for (owner, name, descriptor, is_interface) in &self.method_refs {
            if *is_interface {
                pool.add_interface_methodref(owner, name, descriptor);
            } else {
                pool.add_methodref(owner, name, descriptor);
            }
        }

        let field_entries: Vec<(u16, u16, u16)> = self
            .fields
            .iter()
            .map(|(name, desc, flags)| (*flags, pool.add_utf8(name), pool.add_utf8(desc)))
            .collect();
        let method_entries: Vec<(u16, u16, u16)> = self
            .methods
            .iter()
            .map(|(name, desc, flags)| (*flags, pool.add_utf8(name), pool.add_utf8(desc)))
            .collect();

        let inner_classes_attr = if self.inner_class_outers.is_empty() {
            None
        } else {
            let name_idx = pool.add_utf8("InnerClasses");
            let mut info = Vec::new();
            push_u16(&mut info, self.inner_class_outers.len() as u16);
            for (i, outer) in self.inner_class_outers.iter().enumerate() {
                let inner_name = format!("{}${}", self.this_name, i + 1);
                let inner_idx = pool.add_class(&inner_name);
                let outer_idx = pool.add_class(outer);
                let simple_name_idx = pool.add_utf8(&(i + 1).to_string());
                push_u16(&mut info, inner_idx);
                push_u16(&mut info, outer_idx);
                push_u16(&mut info, simple_name_idx);
                push_u16(&mut info, 0); // inner_class_access_flags
            }
            Some((name_idx, info))
        };

        let mut out = Vec::new();
        out.extend_from_slice(&[0xCA, 0xFE, 0xBA, 0xBE]);
        push_u16(&mut out, 0); // minor
        push_u16(&mut out, self.major_version);
        pool.serialize_into(&mut out);
        push_u16(&mut out, self.access_flags);
        push_u16(&mut out, this_idx);
        push_u16(&mut out, super_idx);
        push_u16(&mut out, interface_idxs.len() as u16);
        for idx in interface_idxs {
            push_u16(&mut out, idx);
        }
        push_u16(&mut out, field_entries.len() as u16);
        for (flags, name_idx, desc_idx) in &field_entries {
            push_u16(&mut out, *flags);
            push_u16(&mut out, *name_idx);
            push_u16(&mut out, *desc_idx);
            push_u16(&mut out, 0); // attributes_count
        }
        push_u16(&mut out, method_entries.len() as u16);
        for (flags, name_idx, desc_idx) in &method_entries {
            push_u16(&mut out, *flags);
            push_u16(&mut out, *name_idx);
            push_u16(&mut out, *desc_idx);
            push_u16(&mut out, 0); // attributes_count
        }
        match inner_classes_attr {
            Some((name_idx, info)) => {
                push_u16(&mut out, 1);
                push_u16(&mut out, name_idx);
                push_u32(&mut out, info.len() as u32);
                out.extend_from_slice(&info);
            }
            None => push_u16(&mut out, 0),
        }
        out
    }
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// Accumulates constant pool entries, deduplicating `Utf8` and `Class`
/// entries so callers can reference the same name repeatedly.
struct ConstantPoolWriter {
    entries: Vec<PoolEntry>,
    utf8_index: std::collections::HashMap<String, u16>,
    class_index: std::collections::HashMap<String, u16>,
}

enum PoolEntry {
    Utf8(String),
    Class { name_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    Fieldref { class_index: u16, nat_index: u16 },
    Methodref { class_index: u16, nat_index: u16 },
    InterfaceMethodref { class_index: u16, nat_index: u16 },
}

impl ConstantPoolWriter {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            utf8_index: std::collections::HashMap::new(),
            class_index: std::collections::HashMap::new(),
        }
    }

    fn push(&mut self, entry: PoolEntry) -> u16 {
        self.entries.push(entry);
        self.entries.len() as u16 // 1-based constant pool index
    }

    fn add_utf8(&mut self, s: &str) -> u16 {
        if let Some(idx) = self.utf8_index.get(s) {
            return *idx;
        }
        let idx = self.push(PoolEntry::Utf8(s.to_string()));
        self.utf8_index.insert(s.to_string(), idx);
        idx
    }

    fn add_class(&mut self, internal_name: &str) -> u16 {
        if let Some(idx) = self.class_index.get(internal_name) {
            return *idx;
        }
        let name_index = self.add_utf8(internal_name);
        let idx = self.push(PoolEntry::Class { name_index });
        self.class_index.insert(internal_name.to_string(), idx);
        idx
    }

    fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.push(PoolEntry::NameAndType { name_index, descriptor_index })
    }

    fn add_fieldref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(owner);
        let nat_index = self.add_name_and_type(name, descriptor);
        self.push(PoolEntry::Fieldref { class_index, nat_index })
    }

    fn add_methodref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(owner);
        let nat_index = self.add_name_and_type(name, descriptor);
        self.push(PoolEntry::Methodref { class_index, nat_index })
    }

    fn add_interface_methodref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(owner);
        let nat_index = self.add_name_and_type(name, descriptor);
        self.push(PoolEntry::InterfaceMethodref { class_index, nat_index })
    }

    fn serialize_into(&self, out: &mut Vec<u8>) {
        push_u16(out, self.entries.len() as u16 + 1);
        for entry in &self.entries {
            match entry {
                PoolEntry::Utf8(s) => {
                    out.push(1);
                    push_u16(out, s.len() as u16);
                    out.extend_from_slice(s.as_bytes());
                }
                PoolEntry::Class { name_index } => {
                    out.push(7);
                    push_u16(out, *name_index);
                }
                PoolEntry::NameAndType { name_index, descriptor_index } => {
                    out.push(12);
                    push_u16(out, *name_index);
                    push_u16(out, *descriptor_index);
                }
                PoolEntry::Fieldref { class_index, nat_index } => {
                    out.push(9);
                    push_u16(out, *class_index);
                    push_u16(out, *nat_index);
                }
                PoolEntry::Methodref { class_index, nat_index } => {
                    out.push(10);
                    push_u16(out, *class_index);
                    push_u16(out, *nat_index);
                }
                PoolEntry::InterfaceMethodref { class_index, nat_index } => {
                    out.push(11);
                    push_u16(out, *class_index);
                    push_u16(out, *nat_index);
                }
            }
        }
    }
}
