use crate::common::constants::ReceiverClassification;
use crate::descriptor::{CallableDescriptor, FieldDescriptor, Parameter, TypeDescriptor};

/// The verdict of [`validate`]. Advisory: it never blocks a redirection on its own.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ValidationOutcome {
    compatible: bool,
    reason: Option<String>,
}

impl ValidationOutcome {
    fn compatible() -> Self {
        Self {
            compatible: true,
            reason: None,
        }
    }

    fn incompatible(reason: impl Into<String>) -> Self {
        Self {
            compatible: false,
            reason: Some(reason.into()),
        }
    }

    /// Returns `true` if every check passed.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.compatible
    }

    /// The first failed check, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// Classify how `callable` receives its receiver.
#[must_use]
pub fn classify(callable: &CallableDescriptor) -> ReceiverClassification {
    if !callable.is_static() {
        return ReceiverClassification::Instance;
    }
    if callable.is_receiver_first() {
        if callable.parameters().is_empty() {
            return ReceiverClassification::Invalid;
        }
        return ReceiverClassification::Extension;
    }
    ReceiverClassification::Static
}

/// Check whether `destination` can stand in for `source`.
///
/// Checks run in order and the first failure is reported:
///
/// 1. both descriptors are present;
/// 2. the destination's declaring type adds no instance state its bases lack;
/// 3. return types are identical;
/// 4. neither side is [`ReceiverClassification::Invalid`];
/// 5. an extension destination receives a supertype of the source's receiver;
/// 6. parameter counts agree once explicit receivers are discounted;
/// 7. remaining parameters agree in type and modifier, position by position.
///
/// Pure, no shared state is touched.
#[must_use]
pub fn validate(
    source: Option<&CallableDescriptor>,
    destination: Option<&CallableDescriptor>,
) -> ValidationOutcome {
    let (Some(source), Some(destination)) = (source, destination) else {
        return ValidationOutcome::incompatible("source or destination is missing");
    };
    let destination_type = destination.declaring_type();
    if let Some(field) = unbacked_field(destination_type) {
        return ValidationOutcome::incompatible(format!(
            "field safety: {} declares instance field `{}: {}` that no base type exposes, \
             but {} runs against the receiver of {}",
            destination_type.name(),
            field.name(),
            field.ty(),
            destination.identity(),
            source.identity()
        ));
    }
    if source.return_type() != destination.return_type() {
        return ValidationOutcome::incompatible(format!(
            "return type mismatch: {} returns {}, {} returns {}",
            source.identity(),
            source.return_type().name(),
            destination.identity(),
            destination.return_type().name()
        ));
    }
    let source_kind = classify(source);
    let destination_kind = classify(destination);
    for (callable, kind) in [(source, source_kind), (destination, destination_kind)] {
        if ReceiverClassification::Invalid == kind {
            return ValidationOutcome::incompatible(format!(
                "{} is receiver-first but declares no parameters",
                callable.identity()
            ));
        }
    }
    if matches!(
        source_kind,
        ReceiverClassification::Instance | ReceiverClassification::Extension
    ) && ReceiverClassification::Extension == destination_kind
    {
        if let (Some(source_receiver), Some(destination_receiver)) =
            (source.receiver_type(), destination.receiver_type())
        {
            if !destination_receiver.is_assignable_from(source_receiver) {
                return ValidationOutcome::incompatible(format!(
                    "receiver mismatch: {} takes {} but {} is called on {}",
                    destination.identity(),
                    destination_receiver.name(),
                    source.identity(),
                    source_receiver.name()
                ));
            }
        }
    }
    let source_parameters = explicit_parameters(source, source_kind);
    let destination_parameters = explicit_parameters(destination, destination_kind);
    if source_parameters.len() != destination_parameters.len() {
        return ValidationOutcome::incompatible(format!(
            "parameter count mismatch: {} takes {}, {} takes {}",
            source.identity(),
            source_parameters.len(),
            destination.identity(),
            destination_parameters.len()
        ));
    }
    for (index, (expected, actual)) in source_parameters
        .iter()
        .zip(destination_parameters)
        .enumerate()
    {
        if expected.ty() != actual.ty() || expected.modifier() != actual.modifier() {
            return ValidationOutcome::incompatible(format!(
                "parameter {index} mismatch: expected {} {}, found {} {}",
                expected.modifier(),
                expected.ty().name(),
                actual.modifier(),
                actual.ty().name()
            ));
        }
    }
    ValidationOutcome::compatible()
}

/// Parameters after dropping the explicit receiver of an extension.
fn explicit_parameters(
    callable: &CallableDescriptor,
    kind: ReceiverClassification,
) -> &[Parameter] {
    let parameters = callable.parameters();
    if ReceiverClassification::Extension == kind {
        return &parameters[1..];
    }
    parameters
}

/// The first instance field of `ty` with no non-private counterpart on its base chain.
fn unbacked_field(ty: &TypeDescriptor) -> Option<&FieldDescriptor> {
    ty.fields().iter().filter(|field| !field.is_static()).find(|field| {
        !ty.ancestors().any(|base| {
            base.fields().iter().any(|inherited| {
                !inherited.is_static()
                    && !inherited.visibility().is_private()
                    && inherited.name() == field.name()
                    && inherited.ty() == field.ty()
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::{ParamModifier, Visibility};
    use std::sync::Arc;

    fn ty(name: &str) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::new(name))
    }

    #[test]
    fn classification() {
        let owner = ty("Owner");
        let void = ty("void");
        let instance = CallableDescriptor::instance(owner.clone(), "a", void.clone());
        assert_eq!(ReceiverClassification::Instance, classify(&instance));
        // receiver-first only means something for static functions
        assert_eq!(
            ReceiverClassification::Instance,
            classify(&instance.clone().receiver_first())
        );
        let free = CallableDescriptor::function(owner.clone(), "b", void.clone());
        assert_eq!(ReceiverClassification::Static, classify(&free));
        assert_eq!(
            ReceiverClassification::Invalid,
            classify(&free.clone().receiver_first())
        );
        let ext = free
            .receiver_first()
            .with_parameter(Parameter::value(owner));
        assert_eq!(ReceiverClassification::Extension, classify(&ext));
    }

    #[test]
    fn missing_descriptor() {
        let f = CallableDescriptor::function(ty("A"), "F", ty("void"));
        assert!(!validate(None, Some(&f)).is_compatible());
        assert!(!validate(Some(&f), None).is_compatible());
        assert!(validate(Some(&f), Some(&f)).is_compatible());
    }

    #[test]
    fn inherited_fields_are_safe() {
        let base = Arc::new(
            TypeDescriptor::new("Window")
                .with_field(FieldDescriptor::instance("title", "string"))
                .with_field(
                    FieldDescriptor::instance("handle", "int").with_visibility(Visibility::Private),
                ),
        );
        let redeclared = Arc::new(
            TypeDescriptor::new("PatchedWindow")
                .with_base(base.clone())
                .with_field(
                    FieldDescriptor::instance("title", "string")
                        .with_visibility(Visibility::Protected),
                )
                .with_field(FieldDescriptor::shared("instances", "int")),
        );
        let source = CallableDescriptor::instance(base.clone(), "Draw", ty("void"));
        let destination = CallableDescriptor::instance(redeclared, "Draw", ty("void"));
        assert!(validate(Some(&source), Some(&destination)).is_compatible());

        let private_only = Arc::new(
            TypeDescriptor::new("SneakyWindow")
                .with_base(base)
                .with_field(FieldDescriptor::instance("handle", "int")),
        );
        let destination = CallableDescriptor::instance(private_only, "Draw", ty("void"));
        let outcome = validate(Some(&source), Some(&destination));
        assert!(outcome.reason().unwrap().starts_with("field safety"));
    }

    #[test]
    fn modifiers_must_match() {
        let int = ty("int");
        let source = CallableDescriptor::function(ty("A"), "F", ty("void"))
            .with_parameter(Parameter::new(int.clone(), ParamModifier::Ref));
        let destination = CallableDescriptor::function(ty("B"), "G", ty("void"))
            .with_parameter(Parameter::new(int, ParamModifier::Out));
        let outcome = validate(Some(&source), Some(&destination));
        assert_eq!(
            Some("parameter 0 mismatch: expected Ref int, found Out int"),
            outcome.reason()
        );
    }

    #[test]
    fn invalid_classification_is_rejected() {
        let broken = CallableDescriptor::function(ty("A"), "F", ty("void")).receiver_first();
        let fine = CallableDescriptor::function(ty("B"), "G", ty("void"));
        let outcome = validate(Some(&fine), Some(&broken));
        assert!(outcome.reason().unwrap().contains("receiver-first"));
    }

    #[test]
    fn extension_receiver_must_be_a_supertype() {
        let widget = ty("Widget");
        let window = Arc::new(TypeDescriptor::new("Window").with_base(widget.clone()));
        let source = CallableDescriptor::instance(widget, "Draw", ty("void"));
        let destination = CallableDescriptor::function(ty("Patches"), "Draw", ty("void"))
            .receiver_first()
            .with_parameter(Parameter::value(window));
        let outcome = validate(Some(&source), Some(&destination));
        assert!(outcome.reason().unwrap().starts_with("receiver mismatch"));
    }
}
