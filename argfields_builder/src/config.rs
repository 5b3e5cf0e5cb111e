/// How the post-processing treats a constructor which fails on the parsed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConstructionPolicy {
    /// Log a warning and keep the raw parsed value.
    #[default]
    Lenient,
    /// Fail the parse with a `FieldError::Construction`.
    Strict,
}

/// Configuration threaded into every field of a structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldConfig {
    add_dash_variants: bool,
    construction: ConstructionPolicy,
}

impl FieldConfig {
    /// Also generate the option strings where underscores are replaced with dashes.
    ///
    /// For example, `--no-cache` next to `--no_cache`.
    pub fn with_dash_variants(mut self, add_dash_variants: bool) -> Self {
        self.add_dash_variants = add_dash_variants;
        self
    }

    /// Set the construction policy for non-builtin types.
    pub fn with_construction(mut self, construction: ConstructionPolicy) -> Self {
        self.construction = construction;
        self
    }

    /// Whether dash variants are generated.
    pub fn add_dash_variants(&self) -> bool {
        self.add_dash_variants
    }

    /// The construction policy for non-builtin types.
    pub fn construction(&self) -> ConstructionPolicy {
        self.construction
    }
}
