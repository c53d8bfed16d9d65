use bitflags::bitflags;

bitflags! {
    /// Code elements an annotation may be declared on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Target: u8 {
        const CLASS = 1;
        const METHOD = 1 << 1;
        const PROPERTY = 1 << 2;
        const ANNOTATION = 1 << 3;
        const FUNCTION = 1 << 4;
        const ALL = Self::CLASS.bits()
            | Self::METHOD.bits()
            | Self::PROPERTY.bits()
            | Self::ANNOTATION.bits()
            | Self::FUNCTION.bits();
    }
}

/// Literal names accepted by `@Target`, in the order they are listed in
/// error messages.
pub const TARGET_LITERALS: [(&str, Target); 6] = [
    ("ALL", Target::ALL),
    ("CLASS", Target::CLASS),
    ("METHOD", Target::METHOD),
    ("PROPERTY", Target::PROPERTY),
    ("FUNCTION", Target::FUNCTION),
    ("ANNOTATION", Target::ANNOTATION),
];

impl Target {
    pub fn from_literal(literal: &str) -> Option<Target> {
        TARGET_LITERALS
            .iter()
            .find(|(name, _)| *name == literal)
            .map(|(_, target)| *target)
    }

    /// `ALL, CLASS, METHOD, ...` as listed in "Available targets" messages.
    pub fn available_literals() -> String {
        TARGET_LITERALS
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
