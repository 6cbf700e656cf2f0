//! The Type Registry.
//!
//! Interns source type handles into canonical [`LocalType`] records and
//! resolves declared types into [`TypeInfo`] records. Handles that are
//! structurally equal always resolve to the same record, wherever they were
//! obtained. Records are created lazily on first reference, only ever
//! completed afterwards, and live for the whole run.

use bridge_common::{BridgeError, NameFixup};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::builtins::Builtin;
use crate::source::{DeclId, SourceModel, SourceType, TypeKind, TypeRef};
use crate::spelling::{self, NULL_SPELLING};
use crate::ty::{LocalType, LocalTypeId, TypeInfo, TypeInfoId};

const OBJECT: &str = "::System::Object";
const VALUE_TYPE: &str = "::System::ValueType";
const ENUM: &str = "::System::Enum";
const MULTICAST_DELEGATE: &str = "::System::MulticastDelegate";

pub struct TypeRegistry<'m> {
    model: &'m SourceModel,
    names: NameFixup,
    locals: Vec<LocalType>,
    /// Structural lookup. `SourceType` equality ignores the handle's site.
    by_source: FxHashMap<SourceType, LocalTypeId>,
    /// Predefined entries no source type has claimed yet.
    unresolved: Vec<LocalTypeId>,
    builtins: FxHashMap<Builtin, LocalTypeId>,
    null: LocalTypeId,
    infos: Vec<TypeInfo>,
    /// Full spelled name to record.
    info_by_name: FxHashMap<String, TypeInfoId>,
}

impl<'m> TypeRegistry<'m> {
    /// A registry seeded with the predefined types, all unresolved.
    pub fn new(model: &'m SourceModel, names: NameFixup) -> Self {
        let mut registry = TypeRegistry {
            model,
            names,
            locals: Vec::new(),
            by_source: FxHashMap::default(),
            unresolved: Vec::new(),
            builtins: FxHashMap::default(),
            null: LocalTypeId(0),
            infos: Vec::new(),
            info_by_name: FxHashMap::default(),
        };
        for builtin in Builtin::ALL {
            let id = registry.push_local(
                builtin.spelling().to_string(),
                builtin.is_primitive(),
                Some(builtin),
                None,
            );
            registry.builtins.insert(builtin, id);
            registry.unresolved.push(id);
        }
        registry.null = registry.push_local(
            NULL_SPELLING.to_string(),
            false,
            None,
            Some(SourceType::Null),
        );
        registry.by_source.insert(SourceType::Null, registry.null);
        registry
    }

    pub fn model(&self) -> &'m SourceModel {
        self.model
    }

    pub fn names(&self) -> &NameFixup {
        &self.names
    }

    fn push_local(
        &mut self,
        full_name: String,
        is_primitive: bool,
        builtin: Option<Builtin>,
        source: Option<SourceType>,
    ) -> LocalTypeId {
        let id = LocalTypeId(self.locals.len() as u32);
        self.locals.push(LocalType {
            id,
            full_name,
            is_primitive,
            builtin,
            source,
            type_info: None,
            kind: None,
        });
        id
    }

    /// The canonical record for `ty`. Idempotent.
    ///
    /// A type whose spelling matches a predefined entry that is still
    /// unresolved adopts that entry instead of getting a new one.
    pub fn local_type(&mut self, ty: &SourceType) -> LocalTypeId {
        if let Some(&id) = self.by_source.get(ty) {
            return id;
        }

        let spelled = spelling::spell(self.model, &self.names, ty);
        let predefined = self
            .unresolved
            .iter()
            .position(|id| self.locals[id.0 as usize].full_name == spelled);
        let id = match predefined {
            Some(pos) => {
                let id = self.unresolved.remove(pos);
                self.locals[id.0 as usize].source = Some(ty.clone());
                tracing::debug!(spelling = %spelled, "adopted predefined type");
                id
            }
            None => self.push_local(spelled, false, None, Some(ty.clone())),
        };
        self.by_source.insert(ty.clone(), id);

        if let Some(info) = self.type_info_of(ty) {
            let kind = self.infos[info.0 as usize].kind;
            let local = &mut self.locals[id.0 as usize];
            local.type_info = Some(info);
            local.kind = Some(kind);
            if kind == TypeKind::Enum {
                // Enumerations are integers underneath.
                local.is_primitive = true;
            }
            let record = &mut self.infos[info.0 as usize];
            if record.local_type.is_none() && !matches!(ty, SourceType::ByRef(_)) {
                record.local_type = Some(id);
            }
        }
        id
    }

    pub fn get(&self, id: LocalTypeId) -> &LocalType {
        &self.locals[id.0 as usize]
    }

    pub fn builtin(&self, builtin: Builtin) -> LocalTypeId {
        self.builtins[&builtin]
    }

    /// The type of the `null` literal.
    pub fn null_type(&self) -> LocalTypeId {
        self.null
    }

    pub fn local_types(&self) -> &[LocalType] {
        &self.locals
    }

    /// Predefined entries still waiting for their source type.
    pub fn unresolved_predefined(&self) -> impl Iterator<Item = &LocalType> + '_ {
        self.unresolved.iter().map(|id| self.get(*id))
    }

    /// Resolve a declared type or instantiation. The record is registered
    /// before it is filled, so declarations that mention themselves
    /// terminate.
    pub fn type_info(&mut self, tref: &TypeRef) -> TypeInfoId {
        let model = self.model;
        let full_name = spelling::spell(model, &self.names, &SourceType::Named(tref.clone()));
        if let Some(&id) = self.info_by_name.get(&full_name) {
            return id;
        }

        let id = TypeInfoId(self.infos.len() as u32);
        let decl = model.get(tref.decl);
        self.infos.push(TypeInfo {
            id,
            decl: tref.decl,
            type_ref: tref.clone(),
            name: spelling::type_name(model, &self.names, tref.decl),
            namespace: spelling::namespace(model, &self.names, tref.decl),
            full_name: full_name.clone(),
            full_name_without_generic: spelling::full_name_without_generic(
                model,
                &self.names,
                tref.decl,
            ),
            kind: model.kind(tref.decl),
            base: None,
            exclusive_interfaces: Vec::new(),
            union_of_interfaces: Vec::new(),
            generic_definition: None,
            generic_args: tref.args.clone(),
            local_type: None,
            external: decl.external,
        });
        self.info_by_name.insert(full_name, id);
        self.fill(id, tref);
        id
    }

    fn fill(&mut self, id: TypeInfoId, tref: &TypeRef) {
        let model = self.model;
        let decl = model.get(tref.decl);
        let params = &decl.generic_params;

        let base = model
            .recorded_base(tref.decl)
            .map(|b| b.substitute(params, &tref.args))
            .and_then(|b| self.type_info_of(&b));

        let mut union = Vec::new();
        let mut seen = FxHashSet::default();
        if let Some(base) = base {
            for &interface in &self.infos[base.0 as usize].union_of_interfaces {
                if seen.insert(interface) {
                    union.push(interface);
                }
            }
        }

        let mut exclusive = Vec::new();
        for interface in &decl.interfaces {
            let interface = interface.substitute(params, &tref.args);
            let Some(info) = self.type_info_of(&interface) else {
                continue;
            };
            if !exclusive.contains(&info) {
                exclusive.push(info);
            }
            if seen.insert(info) {
                union.push(info);
            }
            for &inherited in &self.infos[info.0 as usize].union_of_interfaces {
                if seen.insert(inherited) {
                    union.push(inherited);
                }
            }
        }

        let generic_definition = if !tref.args.is_empty() && !model.is_definition(tref) {
            let definition = model.declaration_type(tref.decl);
            definition.as_named().map(|d| self.type_info(d))
        } else {
            None
        };

        let record = &mut self.infos[id.0 as usize];
        record.base = base;
        record.exclusive_interfaces = exclusive;
        record.union_of_interfaces = union;
        record.generic_definition = generic_definition;
    }

    /// Type info for a named type, looking through by-reference wrappers.
    /// Pointers, arrays, parameters and `null` have none.
    pub fn type_info_of(&mut self, ty: &SourceType) -> Option<TypeInfoId> {
        match ty {
            SourceType::Named(tref) => Some(self.type_info(tref)),
            SourceType::ByRef(inner) => self.type_info_of(inner),
            _ => None,
        }
    }

    /// Like [`type_info_of`](Self::type_info_of), for callers that require
    /// a declared type.
    pub fn require_type_info(&mut self, ty: &SourceType) -> Result<TypeInfoId, BridgeError> {
        self.type_info_of(ty).ok_or_else(|| BridgeError::MissingTypeInfo {
            type_name: spelling::spell(self.model, &self.names, ty),
        })
    }

    /// Type info of a declaration, as declared.
    pub fn declared_type_info(&mut self, decl: DeclId) -> Result<TypeInfoId, BridgeError> {
        if self.model.try_get(decl).is_none() {
            return Err(BridgeError::UnknownDeclaration { index: decl.0 });
        }
        let ty = self.model.declaration_type(decl);
        self.require_type_info(&ty)
    }

    pub fn info(&self, id: TypeInfoId) -> &TypeInfo {
        &self.infos[id.0 as usize]
    }

    pub fn infos(&self) -> &[TypeInfo] {
        &self.infos
    }

    pub fn find_info(&self, full_name: &str) -> Option<TypeInfoId> {
        self.info_by_name.get(full_name).copied()
    }

    /// The local type standing for a resolved declaration.
    pub fn local_type_of_info(&mut self, id: TypeInfoId) -> LocalTypeId {
        if let Some(local) = self.info(id).local_type {
            return local;
        }
        let ty = SourceType::Named(self.info(id).type_ref.clone());
        self.local_type(&ty)
    }

    /// Whether `candidate` is a base of `info`, including the implicit
    /// roots every kind derives from.
    pub fn is_base_type(&self, info: TypeInfoId, candidate: TypeInfoId) -> bool {
        let record = self.info(info);
        let candidate_name = self.info(candidate).full_name.as_str();
        let implicit = match record.kind {
            TypeKind::Class | TypeKind::Interface => candidate_name == OBJECT,
            TypeKind::Delegate => candidate_name == MULTICAST_DELEGATE || candidate_name == OBJECT,
            TypeKind::Enum => candidate_name == ENUM,
            TypeKind::Struct => candidate_name == VALUE_TYPE,
        };
        if implicit {
            return true;
        }

        let mut current = record.base;
        while let Some(base) = current {
            if base == candidate {
                return true;
            }
            current = self.info(base).base;
        }
        false
    }

    /// Whether a value of `from` can be used where `to` is expected without
    /// any conversion in the source language.
    pub fn can_implicitly_cast(&self, from: TypeInfoId, to: TypeInfoId) -> bool {
        if from == to || self.is_base_type(from, to) {
            return true;
        }
        self.info(to).kind == TypeKind::Interface
            && self.info(from).union_of_interfaces.contains(&to)
    }
}
