use std::{
    collections::HashMap,
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
    ops::Deref,
    sync::{Arc, OnceLock},
};

/// Size in bytes of every scalar the language manipulates.
pub const WORD_SIZE: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Void,
    Integer,
    Reference,
    Array,
    Structure,
}

/// How an expression's result must be consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    /// Declaration-site types, before a category is attached.
    None,
    /// Addressable, persistent storage.
    LValue,
    /// An expiring reference result that still has to be dereferenced once.
    XValue,
    /// A transient value with no storage identity.
    PRValue,
}

/// Coarse classification used by assignment and call lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Primitive,
    Reference,
    Aggregate,
}

/// The tuple a type is interned by.
///
/// `rank` and `element_count` are only set for arrays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeIdentity {
    pub name: String,
    pub rank: Option<u32>,
    pub element_count: Option<u64>,
    pub category: TypeCategory,
    pub value_category: ValueCategory,
}

impl TypeIdentity {
    pub fn atomic(name: &str, category: TypeCategory) -> Self {
        TypeIdentity {
            name: name.to_string(),
            rank: None,
            element_count: None,
            category,
            value_category: ValueCategory::None,
        }
    }

    pub fn with_value_category(&self, value_category: ValueCategory) -> Self {
        TypeIdentity {
            value_category,
            ..self.clone()
        }
    }
}

/// Ordered members of a declared struct.
#[derive(Debug)]
pub struct StructBody {
    pub members: Vec<TypeRef>,
    pub member_names: Vec<String>,
    pub member_name_to_index: HashMap<String, usize>,
}

impl StructBody {
    pub fn member(&self, name: &str) -> Option<(usize, &TypeRef)> {
        let index = *self.member_name_to_index.get(name)?;
        Some((index, &self.members[index]))
    }

    /// Byte offset of member `index`; members are laid out back to back.
    pub fn member_offset(&self, index: usize) -> u64 {
        self.members
            .iter()
            .take(index)
            .map(|member| member.object_size())
            .sum()
    }
}

#[derive(Debug)]
pub(crate) enum Shape {
    Atomic,
    Reference(TypeRef),
    Array(TypeRef),
    /// Shared by every value-category variant of the same struct name, and
    /// filled in once the declaration is seen.
    Structure(Arc<OnceLock<StructBody>>),
}

#[derive(Debug)]
pub struct Type {
    identity: TypeIdentity,
    shape: Shape,
}

impl Type {
    pub(crate) fn new(identity: TypeIdentity, shape: Shape) -> Self {
        Type { identity, shape }
    }

    pub(crate) fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn category(&self) -> TypeCategory {
        self.identity.category
    }

    pub fn value_category(&self) -> ValueCategory {
        self.identity.value_category
    }

    pub fn element_count(&self) -> Option<u64> {
        self.identity.element_count
    }

    pub fn is_void(&self) -> bool {
        self.category() == TypeCategory::Void
    }

    pub fn is_integer(&self) -> bool {
        self.category() == TypeCategory::Integer
    }

    pub fn is_reference(&self) -> bool {
        self.category() == TypeCategory::Reference
    }

    pub fn is_array(&self) -> bool {
        self.category() == TypeCategory::Array
    }

    pub fn is_struct(&self) -> bool {
        self.category() == TypeCategory::Structure
    }

    pub fn is_aggregate(&self) -> bool {
        self.is_array() || self.is_struct()
    }

    pub fn is_prvalue(&self) -> bool {
        self.value_category() == ValueCategory::PRValue
    }

    pub fn storage_class(&self) -> StorageClass {
        match self.category() {
            TypeCategory::Void | TypeCategory::Integer => StorageClass::Primitive,
            TypeCategory::Reference => StorageClass::Reference,
            TypeCategory::Array | TypeCategory::Structure => StorageClass::Aggregate,
        }
    }

    /// The pointee of a reference type.
    pub fn referenced_type(&self) -> Option<&TypeRef> {
        match &self.shape {
            Shape::Reference(pointee) => Some(pointee),
            _ => None,
        }
    }

    /// The element of an array, looking through one reference.
    pub fn element_type(&self) -> Option<&TypeRef> {
        match &self.shape {
            Shape::Array(element) => Some(element),
            Shape::Reference(pointee) => match pointee.shape() {
                Shape::Array(element) => Some(element),
                _ => None,
            },
            _ => None,
        }
    }

    /// The members of a struct type, once its declaration has been registered.
    pub fn struct_body(&self) -> Option<&StructBody> {
        match &self.shape {
            Shape::Structure(body) => body.get(),
            _ => None,
        }
    }

    /// Number of bytes an object of this type occupies.
    ///
    /// Structs are the plain sum of their members, without padding. A
    /// struct whose declaration was never registered has size 0.
    pub fn object_size(&self) -> u64 {
        match &self.shape {
            Shape::Atomic | Shape::Reference(_) => WORD_SIZE,
            Shape::Array(element) => {
                self.identity
                    .element_count
                    .unwrap_or(0)
                    .saturating_mul(element.object_size())
            }
            Shape::Structure(body) => body
                .get()
                .map(|body| {
                    body.members
                        .iter()
                        .fold(0u64, |size, m| size.saturating_add(m.object_size()))
                })
                .unwrap_or(0),
        }
    }

    /// Name followed by the value category, e.g. `int64 (PR Value)`.
    pub fn display_name(&self) -> String {
        let value_category = match self.value_category() {
            ValueCategory::PRValue => "(PR Value)",
            ValueCategory::LValue => "(L Value)",
            ValueCategory::XValue => "(X Value)",
            ValueCategory::None => "(NONE)",
        };

        format!("{} {}", self.name(), value_category)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Shared handle to an interned type.
///
/// Equality and hashing are by identity: two handles are equal exactly
/// when they point at the same interned instance.
#[derive(Clone)]
pub struct TypeRef(Arc<Type>);

impl TypeRef {
    pub(crate) fn new(ty: Type) -> Self {
        TypeRef(Arc::new(ty))
    }

    /// The object a value of this type denotes: the pointee for references,
    /// the type itself otherwise.
    pub fn object(&self) -> TypeRef {
        self.referenced_type().cloned().unwrap_or_else(|| self.clone())
    }

    /// True if both types denote the same object type, ignoring value
    /// category and one level of reference.
    pub fn same_object(&self, other: &TypeRef) -> bool {
        let (a, b) = (self.object(), other.object());
        a.name() == b.name() && a.category() == b.category()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl Deref for TypeRef {
    type Target = Type;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Struct members may refer back to the struct, so never recurse.
impl Debug for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeRef({})", self.display_name())
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
