use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use crate::errors::errors::{Error, ErrorImpl};

use super::types::{
    Shape, StructBody, Type, TypeCategory, TypeIdentity, TypeRef, ValueCategory,
};

#[derive(Debug, Default)]
struct Registry {
    interned: Mutex<HashMap<TypeIdentity, TypeRef>>,
    struct_bodies: Mutex<HashMap<String, Arc<OnceLock<StructBody>>>>,
}

/// Interns types by identity.
///
/// The table is append-only and lives as long as any handle to it. Cloning
/// it is cheap and every clone sees the same registry, so a single table can
/// be shared by the parser, the type checker and the lowering engine, or
/// across threads.
#[derive(Debug, Clone)]
pub struct TypeTable {
    registry: Arc<Registry>,
}

/// False if `ty` mentions a struct whose members are still unknown.
fn is_complete(ty: &TypeRef) -> bool {
    match ty.shape() {
        Shape::Atomic => true,
        Shape::Reference(inner) | Shape::Array(inner) => is_complete(inner),
        Shape::Structure(body) => body.get().is_some(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for TypeTable {
    fn default() -> Self {
        TypeTable::new()
    }
}

impl TypeTable {
    /// Creates a table seeded with `int64` and `void`.
    pub fn new() -> Self {
        let table = TypeTable {
            registry: Arc::new(Registry::default()),
        };

        {
            let mut interned = lock(&table.registry.interned);
            for (name, category) in [("int64", TypeCategory::Integer), ("void", TypeCategory::Void)] {
                let identity = TypeIdentity::atomic(name, category);
                interned.insert(
                    identity.clone(),
                    TypeRef::new(Type::new(identity, Shape::Atomic)),
                );
            }
        }

        table
    }

    /// Returns the canonical type for `identity`, creating it on first request.
    ///
    /// # Arguments
    ///
    /// * `identity` - The identity tuple to intern
    /// * `members` - The pointee of a reference or the element of an array.
    ///   Ignored for every other category; struct members come from
    ///   [`TypeTable::define_struct`].
    ///
    /// # Returns
    ///
    /// The interned type, or an `InternalError` if a reference or array is
    /// requested without exactly one member.
    pub fn get_or_create(&self, identity: TypeIdentity, members: &[TypeRef]) -> Result<TypeRef, Error> {
        let mut interned = lock(&self.registry.interned);

        if let Some(existing) = interned.get(&identity) {
            return Ok(existing.clone());
        }

        let shape = match identity.category {
            TypeCategory::Void | TypeCategory::Integer => Shape::Atomic,
            TypeCategory::Reference | TypeCategory::Array => {
                let [member] = members else {
                    return Err(Error::unpositioned(ErrorImpl::InternalError {
                        message: format!(
                            "type `{}` needs exactly one member, found {}",
                            identity.name,
                            members.len()
                        ),
                    }));
                };

                if identity.category == TypeCategory::Reference {
                    Shape::Reference(member.clone())
                } else {
                    Shape::Array(member.clone())
                }
            }
            TypeCategory::Structure => Shape::Structure(self.struct_slot(&identity.name)),
        };

        tracing::trace!(name = %identity.name, category = ?identity.category, value_category = ?identity.value_category, "interned type");

        let ty = TypeRef::new(Type::new(identity.clone(), shape));
        interned.insert(identity, ty.clone());
        Ok(ty)
    }

    fn struct_slot(&self, name: &str) -> Arc<OnceLock<StructBody>> {
        lock(&self.registry.struct_bodies)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    fn intern_atomic(&self, name: &str, category: TypeCategory, value_category: ValueCategory) -> TypeRef {
        let identity = TypeIdentity::atomic(name, category).with_value_category(value_category);
        let mut interned = lock(&self.registry.interned);

        if let Some(existing) = interned.get(&identity) {
            return existing.clone();
        }

        let shape = match category {
            TypeCategory::Structure => Shape::Structure(self.struct_slot(name)),
            _ => Shape::Atomic,
        };

        let ty = TypeRef::new(Type::new(identity.clone(), shape));
        interned.insert(identity, ty.clone());
        ty
    }

    pub fn int64(&self) -> TypeRef {
        self.intern_atomic("int64", TypeCategory::Integer, ValueCategory::None)
    }

    pub fn void(&self) -> TypeRef {
        self.intern_atomic("void", TypeCategory::Void, ValueCategory::None)
    }

    /// The type of every integer literal: `int64`, PRValue.
    pub fn literal_type(&self) -> TypeRef {
        self.intern_atomic("int64", TypeCategory::Integer, ValueCategory::PRValue)
    }

    /// True once `define_struct` has registered `name`.
    pub fn is_struct_defined(&self, name: &str) -> bool {
        lock(&self.registry.struct_bodies)
            .get(name)
            .is_some_and(|body| body.get().is_some())
    }

    /// Resolves an atomic name that must already be known.
    ///
    /// The parser uses [`TypeTable::find_by_name`] instead so structs can be
    /// named before their declaration; this is for hosts building signatures.
    ///
    /// # Returns
    ///
    /// `int64`, `void` or a declared struct; an `UnknownType` error otherwise.
    pub fn get_atomic_type(&self, name: &str) -> Result<TypeRef, Error> {
        match name {
            "int64" => Ok(self.int64()),
            "void" => Ok(self.void()),
            _ if self.is_struct_defined(name) => Ok(self.find_by_name(name)),
            _ => Err(Error::unpositioned(ErrorImpl::UnknownType {
                type_: name.to_string(),
            })),
        }
    }

    /// Resolves a type name as written in source.
    ///
    /// Names other than `int64` and `void` are structs; one that has not been
    /// declared yet becomes a forward reference that `define_struct` later
    /// fills in.
    pub fn find_by_name(&self, name: &str) -> TypeRef {
        match name {
            "int64" => self.int64(),
            "void" => self.void(),
            _ => self.intern_atomic(name, TypeCategory::Structure, ValueCategory::None),
        }
    }

    fn with_value_category(&self, ty: &TypeRef, value_category: ValueCategory) -> TypeRef {
        if ty.value_category() == value_category {
            return ty.clone();
        }

        let identity = ty.identity().with_value_category(value_category);
        let mut interned = lock(&self.registry.interned);

        if let Some(existing) = interned.get(&identity) {
            return existing.clone();
        }

        let shape = match ty.shape() {
            Shape::Atomic => Shape::Atomic,
            Shape::Reference(pointee) => Shape::Reference(pointee.clone()),
            Shape::Array(element) => Shape::Array(element.clone()),
            Shape::Structure(body) => Shape::Structure(Arc::clone(body)),
        };

        let derived = TypeRef::new(Type::new(identity.clone(), shape));
        interned.insert(identity, derived.clone());
        derived
    }

    pub fn as_prvalue(&self, ty: &TypeRef) -> TypeRef {
        self.with_value_category(ty, ValueCategory::PRValue)
    }

    pub fn as_lvalue(&self, ty: &TypeRef) -> TypeRef {
        self.with_value_category(ty, ValueCategory::LValue)
    }

    /// Nothing in the pipeline yields an XValue: call results, including
    /// reference returns, are typed as PRValues. Kept for hosts that build
    /// types by hand.
    pub fn as_xvalue(&self, ty: &TypeRef) -> TypeRef {
        self.with_value_category(ty, ValueCategory::XValue)
    }

    /// The declaration-site form of `ty` (value category `None`).
    pub fn as_declared(&self, ty: &TypeRef) -> TypeRef {
        self.with_value_category(ty, ValueCategory::None)
    }

    /// A reference to `ty`, named `<ty>&`.
    ///
    /// The pointee is stored in its declared form, so every value category of
    /// `ty` yields the same reference type.
    ///
    /// # Returns
    ///
    /// The reference type, or `ReferenceToReference` if `ty` is a reference.
    pub fn as_reference(&self, ty: &TypeRef) -> Result<TypeRef, Error> {
        if ty.is_reference() {
            return Err(Error::unpositioned(ErrorImpl::ReferenceToReference {
                type_: ty.name().to_string(),
            }));
        }

        let pointee = self.as_declared(ty);
        let identity = TypeIdentity {
            name: format!("{}&", pointee.name()),
            rank: None,
            element_count: None,
            category: TypeCategory::Reference,
            value_category: ValueCategory::None,
        };

        self.get_or_create(identity, &[pointee])
    }

    /// A rank-1 array of `count` elements, named `<element>[<count>]`.
    pub fn array_of(&self, element: &TypeRef, count: u64) -> Result<TypeRef, Error> {
        let element = self.as_declared(element);
        let identity = TypeIdentity {
            name: format!("{}[{}]", element.name(), count),
            rank: Some(1),
            element_count: Some(count),
            category: TypeCategory::Array,
            value_category: ValueCategory::None,
        };

        self.get_or_create(identity, &[element])
    }

    /// Registers the members of struct `name`.
    ///
    /// Every type already handed out for `name`, including forward
    /// references, sees the new members.
    ///
    /// # Returns
    ///
    /// The declared struct type, `StructAlreadyDeclared` if `name` was
    /// registered before, or `DuplicateMember` if two members share a name.
    pub fn define_struct(&self, name: &str, members: Vec<(String, TypeRef)>) -> Result<TypeRef, Error> {
        let mut member_names = Vec::with_capacity(members.len());
        let mut member_types = Vec::with_capacity(members.len());
        let mut member_name_to_index = HashMap::new();

        for (index, (member_name, member_type)) in members.into_iter().enumerate() {
            if member_name_to_index.insert(member_name.clone(), index).is_some() {
                return Err(Error::unpositioned(ErrorImpl::DuplicateMember {
                    structure: name.to_string(),
                    member: member_name,
                }));
            }

            member_types.push(self.as_declared(&member_type));
            member_names.push(member_name);
        }

        let slot = self.struct_slot(name);
        let body = StructBody {
            members: member_types,
            member_names,
            member_name_to_index,
        };

        if slot.set(body).is_err() {
            return Err(Error::unpositioned(ErrorImpl::StructAlreadyDeclared {
                name: name.to_string(),
            }));
        }

        tracing::trace!(name, "registered struct");
        Ok(self.find_by_name(name))
    }

    /// A table that starts from every complete type of `self` but records
    /// new types and struct declarations only in itself.
    ///
    /// Types copied over keep their identity, so a `TypeRef` from the parent
    /// compares equal to the fork's. Forward references to structs the
    /// parent has not defined are left behind; the fork resolves such names
    /// afresh.
    pub fn fork(&self) -> TypeTable {
        let interned = lock(&self.registry.interned)
            .iter()
            .filter(|(_, ty)| is_complete(ty))
            .map(|(identity, ty)| (identity.clone(), ty.clone()))
            .collect();
        let struct_bodies = lock(&self.registry.struct_bodies)
            .iter()
            .filter(|(_, body)| body.get().is_some())
            .map(|(name, body)| (name.clone(), Arc::clone(body)))
            .collect();

        TypeTable {
            registry: Arc::new(Registry {
                interned: Mutex::new(interned),
                struct_bodies: Mutex::new(struct_bodies),
            }),
        }
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        lock(&self.registry.interned).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
