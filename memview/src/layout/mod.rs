/*!
Layouts declared as data.

A [`LayoutRegistry`] holds the named types a layout file declares (aggregates, enumerations and
views) and the compiled layouts of its views and aggregate members. Every field is parsed, rewritten and dispatched
exactly once when it is added, so all declaration errors surface while loading. The compiled
layouts are interpreted at runtime by [`DynView`](crate::dynamic::DynView).
*/

use std::prelude::v1::*;

use crate::decl::{parse_type, BaseKind, BaseType, DeclaredType, Scalar};
use crate::dispatch::{compile, Specialization};
use crate::error::{Error, ErrorKind, ErrorOrigin, Result};
use crate::resolver::{log_declaration, InheritanceModel, Resolver};

use hashbrown::HashMap;
use log::debug;

pub mod file;
#[doc(hidden)]
pub use file::{AggregateEntry, EnumerationEntry, FieldEntry, LayoutFile, Number, ViewEntry};

/// A compiled member of a view layout.
#[derive(Clone, Debug)]
pub struct FieldLayout {
    name: String,
    declared: DeclaredType,
    rewritten: DeclaredType,
    specialization: Specialization,
    resolver: Resolver,
}

impl FieldLayout {
    /// Rewrites and dispatches `declared`.
    pub fn compile<N: Into<String>>(
        name: N,
        declared: DeclaredType,
        resolver: Resolver,
    ) -> Result<Self> {
        let name = name.into();
        let (rewritten, specialization) = compile(&declared)
            .map_err(|err| err.log_debug(format_args!("field {}: {}", name, declared)))?;
        Ok(Self {
            name,
            declared,
            rewritten,
            specialization,
            resolver,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type as it was declared.
    pub fn declared(&self) -> &DeclaredType {
        &self.declared
    }

    /// The declared type with views replaced by weak views.
    pub fn rewritten(&self) -> &DeclaredType {
        &self.rewritten
    }

    pub fn specialization(&self) -> &Specialization {
        &self.specialization
    }

    pub fn resolver(&self) -> Resolver {
        self.resolver
    }
}

/// The compiled layout of a view, or of the members of an aggregate: its fields in declaration
/// order.
#[derive(Clone, Debug)]
pub struct ViewLayout {
    name: String,
    size: Option<usize>,
    fields: Vec<FieldLayout>,
    by_name: HashMap<String, usize>,
}

impl ViewLayout {
    pub fn new<N: Into<String>>(name: N, size: Option<usize>) -> Self {
        Self {
            name: name.into(),
            size,
            fields: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> Option<usize> {
        self.size
    }

    /// The base type member declarations refer to this view by.
    pub fn base_type(&self) -> BaseType {
        BaseType::view(self.name.as_str(), self.size)
    }

    /// Adds a compiled field.
    ///
    /// Fields at fixed offsets must fit into the declared size of the view.
    pub fn push(&mut self, field: FieldLayout) -> Result<()> {
        if self.by_name.contains_key(field.name()) {
            return Err(Error(ErrorOrigin::Layout, ErrorKind::AlreadyExists)
                .log_debug(format_args!("{}.{}", self.name, field.name())));
        }

        if let (Some(size), Resolver::Offset(offset)) = (self.size, field.resolver()) {
            if offset >= 0 {
                let end = (offset as usize).checked_add(field.specialization().size());
                if end.map_or(true, |end| end > size) {
                    return Err(Error(ErrorOrigin::Layout, ErrorKind::OutOfBounds).log_debug(
                        format_args!(
                            "{}.{} at {:#x} does not fit into {:#x} bytes",
                            self.name,
                            field.name(),
                            offset,
                            size
                        ),
                    ));
                }
            }
        }

        debug!(
            "{}.{}: {} -> {} ({:?})",
            self.name,
            field.name(),
            field.declared(),
            field.rewritten(),
            field.specialization().category()
        );
        log_declaration(field.name(), &field.resolver);

        self.by_name.insert(field.name.clone(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldLayout> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Named types and compiled view layouts.
///
/// # Examples
///
/// ```
/// use memview::layout::LayoutRegistry;
/// use memview::dispatch::Category;
///
/// let registry = LayoutRegistry::from_toml(r#"
///     [[view]]
///     name = "Node"
///     size = 0x18
///
///     [[view.field]]
///     name = "value"
///     type = "i32"
///     offset = 0
///
///     [[view.field]]
///     name = "next"
///     type = "*mut Node"
///     offset = 8
/// "#).unwrap();
///
/// let node = registry.view("Node").unwrap();
/// assert_eq!(node.len(), 2);
/// assert_eq!(node.field("next").unwrap().specialization().category(), Category::Pointer);
/// ```
#[derive(Clone, Debug, Default)]
pub struct LayoutRegistry {
    types: HashMap<String, BaseType>,
    views: HashMap<String, ViewLayout>,
    aggregates: HashMap<String, ViewLayout>,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let mut registry = Self::new();
        registry.load(&LayoutFile::from_toml(source)?)?;
        Ok(registry)
    }

    pub fn open<P: AsRef<::std::path::Path>>(path: P) -> Result<Self> {
        let mut registry = Self::new();
        registry.load(&LayoutFile::open(path)?)?;
        Ok(registry)
    }

    /// Registers every type of `file` and compiles its views.
    ///
    /// Names are registered before any field is compiled, so views may refer to each other and
    /// to themselves regardless of their order in the file. Nothing is registered if any
    /// declaration fails.
    pub fn load(&mut self, file: &LayoutFile) -> Result<()> {
        let mut next = self.clone();

        for entry in file.aggregates.iter() {
            let align = entry.align.unwrap_or(1);
            if align == 0 || !align.is_power_of_two() {
                return Err(Error(ErrorOrigin::Layout, ErrorKind::Configuration)
                    .log_debug(format_args!("aggregate {} has alignment {}", entry.name, align)));
            }
            next.register(BaseType::aggregate(entry.name.as_str(), entry.size, align))?;
        }

        for entry in file.enumerations.iter() {
            let repr = Scalar::from_name(&entry.repr)
                .filter(|scalar| scalar.is_integer())
                .ok_or_else(|| {
                    Error(ErrorOrigin::Layout, ErrorKind::Configuration).log_debug(format_args!(
                        "enumeration {} has representation {}",
                        entry.name, entry.repr
                    ))
                })?;
            next.register(BaseType::enumeration(entry.name.as_str(), repr))?;
        }

        for entry in file.views.iter() {
            next.register(BaseType::view(entry.name.as_str(), entry.size))?;
        }

        for entry in file.aggregates.iter() {
            let mut layout = ViewLayout::new(entry.name.as_str(), Some(entry.size));
            for field in entry.fields.iter() {
                let declared = next.parse(&field.ty).map_err(|err| {
                    err.log_debug(format_args!("{}.{}: {}", entry.name, field.name, field.ty))
                })?;
                let resolver = match field_resolver(field)? {
                    Resolver::Offset(offset) if offset >= 0 => Resolver::Offset(offset),
                    _ => {
                        return Err(Error(ErrorOrigin::Layout, ErrorKind::Configuration)
                            .log_debug(format_args!(
                                "{}.{} needs a non negative offset",
                                entry.name, field.name
                            )))
                    }
                };
                layout.push(FieldLayout::compile(field.name.as_str(), declared, resolver)?)?;
            }
            next.aggregates.insert(entry.name.clone(), layout);
        }

        for entry in file.views.iter() {
            let mut layout = ViewLayout::new(entry.name.as_str(), entry.size);
            for field in entry.fields.iter() {
                let declared = next.parse(&field.ty).map_err(|err| {
                    err.log_debug(format_args!("{}.{}: {}", entry.name, field.name, field.ty))
                })?;
                let resolver = field_resolver(field)
                    .map_err(|err| err.log_debug(format_args!("{}.{}", entry.name, field.name)))?;
                layout.push(FieldLayout::compile(field.name.as_str(), declared, resolver)?)?;
            }
            next.insert_view(layout)?;
        }

        *self = next;
        Ok(())
    }

    /// Registers a named base type.
    pub fn register(&mut self, base: BaseType) -> Result<()> {
        let reserved = Scalar::from_name(base.name()).is_some() || base.name() == "fn";
        if reserved || self.types.contains_key(base.name()) {
            return Err(Error(ErrorOrigin::Layout, ErrorKind::AlreadyExists)
                .log_debug(format_args!("type {}", base.name())));
        }
        debug!("registered {} as {:?}", base.name(), base.kind());
        self.types.insert(base.name().to_string(), base);
        Ok(())
    }

    /// Adds a compiled view layout, registering its name if that did not happen yet.
    pub fn insert_view(&mut self, layout: ViewLayout) -> Result<()> {
        match self.types.get(layout.name()) {
            Some(base) if matches!(base.kind(), BaseKind::View { size } if *size == layout.size()) => {}
            Some(_) => {
                return Err(Error(ErrorOrigin::Layout, ErrorKind::AlreadyExists)
                    .log_debug(format_args!("view {}", layout.name())))
            }
            None => self.register(layout.base_type())?,
        }
        if self.views.contains_key(layout.name()) {
            return Err(Error(ErrorOrigin::Layout, ErrorKind::AlreadyExists)
                .log_debug(format_args!("view {}", layout.name())));
        }

        debug!(
            "compiled view {} ({} fields, {:?} bytes)",
            layout.name(),
            layout.len(),
            layout.size()
        );
        self.views.insert(layout.name().to_string(), layout);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<BaseType> {
        self.types.get(name).cloned()
    }

    /// Parses a type expression against the registered names.
    pub fn parse(&self, source: &str) -> Result<DeclaredType> {
        parse_type(source, |name| self.lookup(name))
    }

    pub fn view(&self, name: &str) -> Option<&ViewLayout> {
        self.views.get(name)
    }

    pub fn views(&self) -> impl Iterator<Item = &ViewLayout> {
        self.views.values()
    }

    /// The members of a registered aggregate.
    pub fn aggregate(&self, name: &str) -> Option<&ViewLayout> {
        self.aggregates.get(name)
    }
}

/// Builds the resolver of a field entry. Exactly one resolver key must be present.
fn field_resolver(field: &FieldEntry) -> Result<Resolver> {
    let configuration = || Error(ErrorOrigin::Layout, ErrorKind::Configuration);

    let keys = [
        field.offset.is_some(),
        field.absolute.is_some(),
        field.vtable.is_some(),
    ];
    if keys.iter().filter(|present| **present).count() != 1 {
        return Err(configuration().log_debug("exactly one of offset, absolute or vtable is required"));
    }
    if field.vtable.is_none() && (field.vtable_offset.is_some() || field.inheritance.is_some()) {
        return Err(configuration().log_debug("vtable_offset and inheritance require vtable"));
    }

    if let Some(offset) = &field.offset {
        return offset.to_isize().map(Resolver::offset);
    }
    if let Some(absolute) = &field.absolute {
        return absolute
            .to_usize()
            .map(|address| Resolver::absolute(address.into()));
    }

    let index = field.vtable.ok_or_else(configuration)?;
    let vtable_offset = match &field.vtable_offset {
        Some(offset) => offset.to_isize()?,
        None => 0,
    };
    let model = match &field.inheritance {
        Some(name) => InheritanceModel::from_name(name)
            .ok_or_else(|| configuration().log_debug(format_args!("inheritance {}", name)))?,
        None => InheritanceModel::Single,
    };
    Resolver::virtual_table_for(index, vtable_offset, model)
}
