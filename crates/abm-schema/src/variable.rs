//! Variable definitions and dependency facets.
//!
//! Each variable declares two independent dependency sets: one consulted when
//! ordering initialization, one when ordering per-cycle updates.  The sets
//! are just names of sibling variables; the ordering engine resolves them
//! against the species' full (inherited) variable list and silently ignores
//! names that fall outside the selected subset.

use abm_core::AttrValue;

/// Which dependency facet of a variable the ordering engine should honor.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Facet {
    /// Dependencies that constrain initialization order.
    Init,
    /// Dependencies that constrain per-cycle update order.
    Update,
}

/// One variable declaration in a species schema.
///
/// Construct with [`VarDef::new`] and the fluent `with_*` methods; the schema
/// builder freezes the result inside an immutable [`Species`][crate::Species].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarDef {
    /// Variable name, unique within the species (after inheritance merge).
    pub name: String,

    /// Names of variables whose initial values must exist first.
    pub init_deps: Vec<String>,

    /// Names of variables whose updated values must exist first.  Mutual
    /// update dependencies are legal; the ordering engine drops whichever
    /// edge would close a cycle.
    pub update_deps: Vec<String>,

    /// `true` if the variable is re-evaluated every cycle during `pre_step`.
    pub updatable: bool,

    /// `true` for the synthetic variable that stands for an owned nested
    /// population.  Initializing it creates the micro-population; the
    /// ordering engine forces `shape` before it.
    pub container: bool,

    /// Statically declared initial value, used when the architecture
    /// collaborator supplies none.
    pub default: Option<AttrValue>,
}

impl VarDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            init_deps: Vec::new(),
            update_deps: Vec::new(),
            updatable: false,
            container: false,
            default: None,
        }
    }

    /// The synthetic container variable for a nested species declaration.
    pub(crate) fn container(name: impl Into<String>) -> Self {
        Self {
            container: true,
            ..VarDef::new(name)
        }
    }

    pub fn with_default(mut self, value: impl Into<AttrValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn init_depends_on<S: Into<String>>(mut self, deps: impl IntoIterator<Item = S>) -> Self {
        self.init_deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the variable updatable with the given update-order dependencies.
    pub fn updatable_with<S: Into<String>>(mut self, deps: impl IntoIterator<Item = S>) -> Self {
        self.updatable = true;
        self.update_deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the variable updatable with no ordering constraints.
    pub fn updatable(mut self) -> Self {
        self.updatable = true;
        self
    }

    /// The dependency set for `facet`.
    pub fn deps(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::Init => &self.init_deps,
            Facet::Update => &self.update_deps,
        }
    }
}
