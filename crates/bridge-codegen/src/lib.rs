//! Cast resolution and declaration ordering for the bridge backend.
//!
//! A [`Session`] owns every table that lives for one compilation run: the
//! type registry, the wrapper and synthetic name tables, and the
//! accumulated diagnostics. The emitter threads one session through the
//! whole-program pass.

pub mod cast;
pub mod deps;
pub mod members;

use bridge_common::{
    BridgeConfig, BridgeError, BridgeWarning, Diagnostics, NameFixup, SyntheticNames, WrapperNames,
};
use bridge_types::{DeclId, LocalTypeId, SourceModel, SourceType, TypeInfoId, TypeRegistry};

pub use cast::{explain_cast, resolve_cast, CastDecision, Conversion};
pub use deps::{DependencyGraph, DependencyTag, EmissionPlan};
pub use members::MethodPlan;

/// State of one compilation run.
pub struct Session<'m> {
    config: BridgeConfig,
    registry: TypeRegistry<'m>,
    wrappers: WrapperNames,
    synthetic: SyntheticNames,
    diagnostics: Diagnostics,
}

impl<'m> Session<'m> {
    pub fn new(model: &'m SourceModel, config: BridgeConfig) -> Self {
        let names = NameFixup::new(&config.reserved_identifiers);
        Session {
            registry: TypeRegistry::new(model, names),
            wrappers: WrapperNames::new(&config.wrapper_prefix),
            synthetic: SyntheticNames::new(),
            diagnostics: Diagnostics::new(),
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn model(&self) -> &'m SourceModel {
        self.registry.model()
    }

    pub fn registry(&self) -> &TypeRegistry<'m> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry<'m> {
        &mut self.registry
    }

    pub fn names(&self) -> &NameFixup {
        self.registry.names()
    }

    pub fn local_type(&mut self, ty: &SourceType) -> LocalTypeId {
        self.registry.local_type(ty)
    }

    // ── Casts ──────────────────────────────────────────────────────────

    /// Conversion needed to store a `src` value into a `dst` slot.
    pub fn resolve_cast(&mut self, dst: &SourceType, src: &SourceType) -> Conversion {
        self.explain_cast(dst, src).conversion
    }

    pub fn explain_cast(&mut self, dst: &SourceType, src: &SourceType) -> CastDecision {
        let dst = self.registry.local_type(dst);
        let src = self.registry.local_type(src);
        cast::explain_cast(&mut self.registry, dst, src)
    }

    /// The conversion token, empty when no conversion is needed.
    pub fn cast_token(&mut self, dst: &SourceType, src: &SourceType) -> String {
        let conversion = self.resolve_cast(dst, src);
        conversion.token(&self.config.runtime_namespace)
    }

    /// `value` wrapped in whatever conversion `src` to `dst` needs.
    pub fn apply_cast(&mut self, dst: &SourceType, src: &SourceType, value: &str) -> String {
        let conversion = self.resolve_cast(dst, src);
        conversion.apply(&self.config.runtime_namespace, value)
    }

    // ── Names ──────────────────────────────────────────────────────────

    /// Adapter class name for `interface` implemented inside `owner`.
    pub fn wrapper_name(&mut self, interface: TypeInfoId, owner: TypeInfoId) -> String {
        let interface = self.registry.info(interface);
        let owner = self.registry.info(owner);
        self.wrappers
            .wrapper_name(&interface.full_name, &interface.name, &owner.full_name)
    }

    pub fn synthetic_names(&mut self) -> &mut SyntheticNames {
        &mut self.synthetic
    }

    // ── Members ────────────────────────────────────────────────────────

    pub fn plan_type(&mut self, decl: DeclId) -> Result<Vec<MethodPlan>, BridgeError> {
        members::plan_type(&mut self.registry, &mut self.diagnostics, decl)
    }

    /// Plan the method at `index` in `decl`.
    pub fn plan_method(&mut self, decl: DeclId, index: usize) -> Result<MethodPlan, BridgeError> {
        let model = self.registry.model();
        let method = model
            .try_get(decl)
            .and_then(|d| d.methods.get(index))
            .ok_or(BridgeError::UnknownDeclaration { index: decl.0 })?;
        members::plan_method(&mut self.registry, &mut self.diagnostics, decl, method)
    }

    // ── Ordering ───────────────────────────────────────────────────────

    pub fn dependency_graph(&mut self, decls: &[DeclId]) -> Result<DependencyGraph, BridgeError> {
        DependencyGraph::detect_all(&mut self.registry, decls, self.config.enums_first)
    }

    /// Emission order for `decls`. A cycle is reported as a warning and
    /// the stuck types are still placed at the end.
    pub fn plan_emission(&mut self, decls: &[DeclId]) -> Result<EmissionPlan, BridgeError> {
        let plan = self.dependency_graph(decls)?.plan();
        if let Some(cycle_path) = &plan.cycle {
            self.diagnostics.warn(BridgeWarning::DependencyCycle {
                cycle_path: cycle_path.clone(),
            });
        }
        Ok(plan)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}
