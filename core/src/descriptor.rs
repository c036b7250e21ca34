use crate::common::constants::{ParamModifier, ReceiverClassification, Visibility};
use crate::validator::classify;
use std::fmt::{Debug, Formatter};
use std::io::{Error, ErrorKind};
use std::sync::Arc;

/// A field declared by a type.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct FieldDescriptor {
    name: String,
    ty: String,
    is_static: bool,
    visibility: Visibility,
}

#[allow(missing_docs)]
impl FieldDescriptor {
    /// A public per-instance field.
    pub fn instance(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            is_static: false,
            visibility: Visibility::Public,
        }
    }

    /// A public static field.
    pub fn shared(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            is_static: true,
            ..Self::instance(name, ty)
        }
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the field's type.
    #[must_use]
    pub fn ty(&self) -> &str {
        &self.ty
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }
}

/// A type as the discovery layer sees it. Two descriptors with the same name are the same type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    module: Option<String>,
    base: Option<Arc<TypeDescriptor>>,
    fields: Vec<FieldDescriptor>,
}

#[allow(missing_docs)]
impl TypeDescriptor {
    /// Create a type without base, fields or module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            base: None,
            fields: Vec::new(),
        }
    }

    /// Set the module the type was loaded from.
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Set the direct base type.
    #[must_use]
    pub fn with_base(mut self, base: Arc<TypeDescriptor>) -> Self {
        self.base = Some(base);
        self
    }

    /// Add a field declared directly by this type.
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    #[must_use]
    pub fn base(&self) -> Option<&Arc<TypeDescriptor>> {
        self.base.as_ref()
    }

    /// Fields declared directly by this type, inherited ones excluded.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The base chain, nearest first, excluding `self`.
    pub fn ancestors(&self) -> impl Iterator<Item = &TypeDescriptor> {
        std::iter::successors(self.base.as_deref(), |ty| ty.base.as_deref())
    }

    /// Returns `true` if a value of type `other` can be used where `self` is expected,
    /// that is `self` is `other` or one of its ancestors.
    #[must_use]
    pub fn is_assignable_from(&self, other: &TypeDescriptor) -> bool {
        std::iter::once(other)
            .chain(other.ancestors())
            .any(|ty| ty == self)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeDescriptor {}

/// One formal parameter.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Parameter {
    ty: Arc<TypeDescriptor>,
    modifier: ParamModifier,
}

#[allow(missing_docs)]
impl Parameter {
    #[must_use]
    pub fn new(ty: Arc<TypeDescriptor>, modifier: ParamModifier) -> Self {
        Self { ty, modifier }
    }

    /// A parameter passed by value.
    #[must_use]
    pub fn value(ty: Arc<TypeDescriptor>) -> Self {
        Self::new(ty, ParamModifier::Value)
    }

    #[must_use]
    pub fn ty(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    #[must_use]
    pub fn modifier(&self) -> ParamModifier {
        self.modifier
    }
}

/// Where the compiled body of a callable starts.
#[derive(Clone)]
pub enum EntryPoint {
    /// Already compiled, at this address.
    Address(usize),
    /// Forces code generation and returns the resulting address.
    Deferred(Arc<dyn Fn() -> std::io::Result<usize> + Send + Sync>),
}

impl EntryPoint {
    /// Entry of an already compiled function.
    #[must_use]
    pub fn from_ptr(ptr: *const ()) -> Self {
        EntryPoint::Address(ptr as usize)
    }

    /// Entry produced by `f` each time it is resolved.
    pub fn deferred(f: impl Fn() -> std::io::Result<usize> + Send + Sync + 'static) -> Self {
        EntryPoint::Deferred(Arc::new(f))
    }

    /// Resolve to a non-null address, compiling first if needed.
    pub fn resolve(&self) -> std::io::Result<usize> {
        let address = match self {
            EntryPoint::Address(address) => *address,
            EntryPoint::Deferred(compile) => compile()?,
        };
        if address == 0 {
            return Err(Error::new(ErrorKind::NotFound, "entry address is null"));
        }
        Ok(address)
    }
}

impl Debug for EntryPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryPoint::Address(address) => write!(f, "Address({address:#x})"),
            EntryPoint::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

/// Everything the engine needs to know about one function.
#[derive(Debug, Clone)]
pub struct CallableDescriptor {
    name: String,
    declaring_type: Arc<TypeDescriptor>,
    is_static: bool,
    receiver_first: bool,
    parameters: Vec<Parameter>,
    return_type: Arc<TypeDescriptor>,
    entry: Option<EntryPoint>,
}

#[allow(missing_docs)]
impl CallableDescriptor {
    /// A non-static member of `declaring_type`.
    pub fn instance(
        declaring_type: Arc<TypeDescriptor>,
        name: impl Into<String>,
        return_type: Arc<TypeDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            is_static: false,
            receiver_first: false,
            parameters: Vec::new(),
            return_type,
            entry: None,
        }
    }

    /// A static function declared by `declaring_type`.
    pub fn function(
        declaring_type: Arc<TypeDescriptor>,
        name: impl Into<String>,
        return_type: Arc<TypeDescriptor>,
    ) -> Self {
        Self {
            is_static: true,
            ..Self::instance(declaring_type, name, return_type)
        }
    }

    /// Mark as called like a member of its first parameter's type.
    #[must_use]
    pub fn receiver_first(mut self) -> Self {
        self.receiver_first = true;
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn with_entry(mut self, entry: EntryPoint) -> Self {
        self.entry = Some(entry);
        self
    }

    /// `<declaring type>.<name>(<parameters>)`, unique per callable, overloads included.
    ///
    /// Parameters are listed by type name, prefixed with `in`, `out` or `ref` unless passed
    /// by value, e.g. `Window.Draw(int, ref Rect)`.
    #[must_use]
    pub fn identity(&self) -> String {
        let parameters = self
            .parameters
            .iter()
            .map(|parameter| match parameter.modifier().keyword() {
                Some(keyword) => format!("{keyword} {}", parameter.ty().name()),
                None => parameter.ty().name().to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}.{}({parameters})", self.declaring_type.name(), self.name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn declaring_type(&self) -> &Arc<TypeDescriptor> {
        &self.declaring_type
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[must_use]
    pub fn is_receiver_first(&self) -> bool {
        self.receiver_first
    }

    /// Formal parameters, the explicit receiver of a receiver-first function included.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[must_use]
    pub fn return_type(&self) -> &Arc<TypeDescriptor> {
        &self.return_type
    }

    #[must_use]
    pub fn entry(&self) -> Option<&EntryPoint> {
        self.entry.as_ref()
    }

    /// The type of the receiver, if the callable has one.
    #[must_use]
    pub fn receiver_type(&self) -> Option<&Arc<TypeDescriptor>> {
        match classify(self) {
            ReceiverClassification::Instance => Some(&self.declaring_type),
            ReceiverClassification::Extension => self.parameters.first().map(Parameter::ty),
            ReceiverClassification::Static | ReceiverClassification::Invalid => None,
        }
    }

    /// The name of the module the declaring type was loaded from.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.declaring_type.module()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignability_walks_the_base_chain() {
        let object = Arc::new(TypeDescriptor::new("Object"));
        let widget = Arc::new(TypeDescriptor::new("Widget").with_base(object.clone()));
        let window = TypeDescriptor::new("Window").with_base(widget.clone());
        assert!(object.is_assignable_from(&window));
        assert!(widget.is_assignable_from(&window));
        assert!(window.is_assignable_from(&window));
        assert!(!window.is_assignable_from(&widget));
        assert_eq!(
            vec!["Widget", "Object"],
            window.ancestors().map(TypeDescriptor::name).collect::<Vec<_>>()
        );
    }

    #[test]
    fn receiver_type_follows_classification() {
        let void = Arc::new(TypeDescriptor::new("void"));
        let window = Arc::new(TypeDescriptor::new("Window"));
        let ext = Arc::new(TypeDescriptor::new("WindowExt"));
        let draw = CallableDescriptor::instance(window.clone(), "Draw", void.clone());
        assert_eq!(Some(&window), draw.receiver_type());
        assert_eq!("Window.Draw()", draw.identity());

        let draw_ext = CallableDescriptor::function(ext.clone(), "Draw", void.clone())
            .receiver_first()
            .with_parameter(Parameter::value(window.clone()));
        assert_eq!(Some(&window), draw_ext.receiver_type());
        assert_eq!("WindowExt.Draw(Window)", draw_ext.identity());

        let helper = CallableDescriptor::function(ext, "Helper", void);
        assert_eq!(None, helper.receiver_type());
    }

    #[test]
    fn overloads_have_distinct_identities() {
        let window = Arc::new(TypeDescriptor::new("Window"));
        let void = Arc::new(TypeDescriptor::new("void"));
        let int = Arc::new(TypeDescriptor::new("int"));
        let draw = CallableDescriptor::instance(window.clone(), "Draw", void.clone());
        let draw_int = draw.clone().with_parameter(Parameter::value(int.clone()));
        let draw_ref = draw
            .clone()
            .with_parameter(Parameter::new(int, ParamModifier::Ref));
        assert_eq!("Window.Draw(int)", draw_int.identity());
        assert_eq!("Window.Draw(ref int)", draw_ref.identity());
        assert_ne!(draw.identity(), draw_int.identity());
        assert_ne!(draw_int.identity(), draw_ref.identity());
    }

    #[test]
    fn entry_resolution() {
        assert_eq!(0x1000, EntryPoint::Address(0x1000).resolve().unwrap());
        assert_eq!(
            ErrorKind::NotFound,
            EntryPoint::Address(0).resolve().unwrap_err().kind()
        );
        assert_eq!(0x2000, EntryPoint::deferred(|| Ok(0x2000)).resolve().unwrap());
        let failing = EntryPoint::deferred(|| Err(Error::new(ErrorKind::Other, "jit failed")));
        assert_eq!("jit failed", failing.resolve().unwrap_err().to_string());
    }
}
