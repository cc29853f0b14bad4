//! Class repositories: where descriptors come from.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{Annotation, ClassDescriptor, ClassKind, MethodDescriptor, PrimitiveType, TypeRef};
use crate::ident::ClassName;

/// Read-only source of class descriptors.
///
/// Implementations must be consistent: `descriptor(name)` returns the same
/// descriptor until the repository is deliberately changed (hot swap), and
/// every name in `class_names()` has a descriptor.
pub trait ClassRepository: Send + Sync + 'static {
    /// The descriptor for `name`, or `None` if the class is unknown.
    fn descriptor(&self, name: &ClassName) -> Option<Arc<ClassDescriptor>>;

    /// Every class the repository knows, in registration order.
    fn class_names(&self) -> Vec<ClassName>;

    /// Returns true if a value of `from` may be used where `to` is expected.
    ///
    /// Reflexive and transitive over superclasses and interfaces. Every
    /// non-primitive type is assignable to the root object, and arrays are
    /// covariant in their reference component type.
    fn is_assignable(&self, from: &ClassName, to: &ClassName) -> bool {
        if from == to {
            return true;
        }
        match (from.component(), to.component()) {
            (Some(from_component), Some(to_component)) => {
                return !builtin::is_primitive(&from_component)
                    && !builtin::is_primitive(&to_component)
                    && self.is_assignable(&from_component, &to_component);
            }
            (Some(_), None) => return to.as_str() == builtin::OBJECT,
            (None, Some(_)) => return false,
            (None, None) => {}
        }

        let Some(descriptor) = self.descriptor(from) else {
            return false;
        };
        if descriptor.kind == ClassKind::Primitive {
            return false;
        }
        if to.as_str() == builtin::OBJECT {
            return true;
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([descriptor]);
        while let Some(current) = queue.pop_front() {
            for parent in current.superclass.iter().chain(&current.interfaces) {
                if parent == to {
                    return true;
                }
                if seen.insert(parent.clone())
                    && let Some(parent_descriptor) = self.descriptor(parent)
                {
                    queue.push_back(parent_descriptor);
                }
            }
        }
        false
    }
}

/// A [`ClassRepository`] held in memory.
///
/// Descriptors can be swapped at runtime with [`replace`](Self::replace),
/// after which the specification loader's `reload` picks up the new shape.
///
/// ```
/// use kestrel_metamodel::class::{ClassDescriptor, ClassRepository, InMemoryClassRepository};
/// use kestrel_metamodel::ident::ClassName;
///
/// let repository = InMemoryClassRepository::with_builtins()
///     .with(ClassDescriptor::class("com.acme.Customer"));
///
/// assert!(repository.descriptor(&ClassName::new("com.acme.Customer")).is_some());
/// ```
#[derive(Default)]
pub struct InMemoryClassRepository {
    classes: RwLock<IndexMap<ClassName, Arc<ClassDescriptor>>>,
}

impl InMemoryClassRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding the builtin types.
    #[must_use]
    pub fn with_builtins() -> Self {
        let repository = Self::new();
        for descriptor in builtin::descriptors() {
            repository.register(descriptor);
        }
        repository
    }

    /// Adds a descriptor, builder style.
    #[must_use]
    pub fn with(self, descriptor: ClassDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Adds or overwrites a descriptor, returning the previous one.
    pub fn register(&self, descriptor: ClassDescriptor) -> Option<Arc<ClassDescriptor>> {
        self.classes
            .write()
            .insert(descriptor.name.clone(), Arc::new(descriptor))
    }

    /// Hot-swaps the descriptor of an existing class.
    ///
    /// Returns the replaced descriptor, or `None` if the class was new.
    pub fn replace(&self, descriptor: ClassDescriptor) -> Option<Arc<ClassDescriptor>> {
        tracing::debug!(class = %descriptor.name, "replacing class descriptor");
        self.register(descriptor)
    }

    /// Removes a class.
    pub fn remove(&self, name: &ClassName) -> Option<Arc<ClassDescriptor>> {
        self.classes.write().shift_remove(name)
    }

    /// Returns true if the class is known.
    #[must_use]
    pub fn contains(&self, name: &ClassName) -> bool {
        self.classes.read().contains_key(name)
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Returns true if the repository holds no classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

impl ClassRepository for InMemoryClassRepository {
    fn descriptor(&self, name: &ClassName) -> Option<Arc<ClassDescriptor>> {
        self.classes.read().get(name).cloned()
    }

    fn class_names(&self) -> Vec<ClassName> {
        self.classes.read().keys().cloned().collect()
    }
}

/// Names and descriptors of the types every repository starts with.
pub mod builtin {
    use super::{Annotation, ClassDescriptor, MethodDescriptor, PrimitiveType, TypeRef};
    use crate::ident::ClassName;

    /// The root of every class hierarchy.
    pub const OBJECT: &str = "kestrel.lang.Object";
    /// Character strings.
    pub const STRING: &str = "kestrel.lang.String";
    /// Boxed `boolean`.
    pub const BOOLEAN: &str = "kestrel.lang.Boolean";
    /// Boxed `byte`.
    pub const BYTE: &str = "kestrel.lang.Byte";
    /// Boxed `short`.
    pub const SHORT: &str = "kestrel.lang.Short";
    /// Boxed `int`.
    pub const INTEGER: &str = "kestrel.lang.Integer";
    /// Boxed `long`.
    pub const LONG: &str = "kestrel.lang.Long";
    /// Boxed `float`.
    pub const FLOAT: &str = "kestrel.lang.Float";
    /// Boxed `double`.
    pub const DOUBLE: &str = "kestrel.lang.Double";
    /// Boxed `char`.
    pub const CHARACTER: &str = "kestrel.lang.Character";
    /// Arbitrary precision integers.
    pub const BIG_INTEGER: &str = "kestrel.math.BigInteger";
    /// Arbitrary precision decimals.
    pub const BIG_DECIMAL: &str = "kestrel.math.BigDecimal";
    /// Calendar dates.
    pub const LOCAL_DATE: &str = "kestrel.time.LocalDate";
    /// Date and time without zone.
    pub const LOCAL_DATE_TIME: &str = "kestrel.time.LocalDateTime";
    /// Natural ordering.
    pub const COMPARABLE: &str = "kestrel.lang.Comparable";

    const BUILTIN_PREFIX: &str = "kestrel.";

    /// Returns true for framework-provided types, primitives included.
    #[must_use]
    pub fn is_builtin(name: &ClassName) -> bool {
        name.as_str().starts_with(BUILTIN_PREFIX) || is_primitive(name)
    }

    /// Returns true for primitive class names.
    #[must_use]
    pub fn is_primitive(name: &ClassName) -> bool {
        PrimitiveType::from_name(name.as_str()).is_some()
    }

    fn value(name: &str) -> ClassDescriptor {
        ClassDescriptor::class(name)
            .implements(COMPARABLE)
            .annotate(Annotation::Value)
    }

    /// Descriptors of all builtin types.
    #[must_use]
    pub fn descriptors() -> Vec<ClassDescriptor> {
        let object = ClassDescriptor::class(OBJECT)
            .root()
            .method(MethodDescriptor::new("toString").returns(TypeRef::class(STRING)))
            .method(
                MethodDescriptor::new("equals")
                    .param("other", TypeRef::class(OBJECT))
                    .returns(TypeRef::Primitive(PrimitiveType::Boolean)),
            )
            .method(MethodDescriptor::new("hashCode").returns(TypeRef::Primitive(PrimitiveType::Int)));

        let comparable = ClassDescriptor::interface(COMPARABLE).method(
            MethodDescriptor::new("compareTo")
                .param("other", TypeRef::class(OBJECT))
                .returns(TypeRef::Primitive(PrimitiveType::Int)),
        );

        let mut descriptors = vec![object, comparable];
        descriptors.extend(
            PrimitiveType::ALL
                .into_iter()
                .map(|p| ClassDescriptor::primitive(p).annotate(Annotation::Value)),
        );
        descriptors.extend(
            [
                STRING,
                BOOLEAN,
                BYTE,
                SHORT,
                INTEGER,
                LONG,
                FLOAT,
                DOUBLE,
                CHARACTER,
                BIG_INTEGER,
                BIG_DECIMAL,
                LOCAL_DATE,
                LOCAL_DATE_TIME,
            ]
            .into_iter()
            .map(value),
        );
        descriptors
    }
}
