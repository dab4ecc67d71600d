/*!
Views interpreted at runtime.

A [`DynView`] binds a compiled [`ViewLayout`] to a base address. Its fields are [`DynField`]
handles that carry the rewritten type and the specialization the dispatcher selected for it.
Every operation checks the capability set of that specialization before it touches memory, so
asking a weak view for arithmetic or an integer for a subscript fails with `NotSupported`
instead of reinterpreting memory.

```
use memview::prelude::v1::*;

let registry = LayoutRegistry::from_toml(r#"
    [[view]]
    name = "Counter"
    size = 8

    [[view.field]]
    name = "count"
    type = "i32"
    offset = 0
"#).unwrap();

let mut backing = [0i32, 0];
backing[0] = 1000;

let counter = unsafe {
    DynView::new(&registry, "Counter", Address::from_ptr(backing.as_mut_ptr())).unwrap()
};
let mut count = counter.field("count").unwrap();

assert_eq!(count.binary(BinaryOp::Add, &Value::I32(100)).unwrap(), Value::I32(1100));
count.assign_op(BinaryOp::Rem, &Value::I32(100)).unwrap();
assert_eq!(count.read().unwrap(), Value::I32(0));
assert!(count.index(0).is_err());
```
*/

use std::prelude::v1::*;

use std::slice;

use crate::decl::DeclaredType;
use crate::dispatch::{
    dispatch, BinaryOp, Capabilities, Category, CompareOp, LogicalOp, Specialization, UnaryOp,
};
use crate::error::{Error, ErrorKind, ErrorOrigin, Result};
use crate::layout::{FieldLayout, LayoutRegistry, ViewLayout};
use crate::view::{Binding, Parent};
use crate::types::Address;

use log::trace;

pub mod value;
#[doc(hidden)]
pub use value::Value;

/// A compiled view layout bound to a base address.
#[derive(Copy, Clone, Debug)]
pub struct DynView<'a> {
    registry: &'a LayoutRegistry,
    layout: &'a ViewLayout,
    base: Address,
}

impl<'a> DynView<'a> {
    /// Binds the view named `name` to `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to an object with the layout the view describes for as long as the view
    /// or any field derived from it is used.
    pub unsafe fn new(registry: &'a LayoutRegistry, name: &str, base: Address) -> Result<Self> {
        let layout = registry.view(name).ok_or_else(|| {
            Error(ErrorOrigin::View, ErrorKind::NotFound).log_debug(format_args!("view {}", name))
        })?;
        Ok(Self::with_layout(registry, layout, base))
    }

    /// # Safety
    ///
    /// See [`new`](Self::new).
    pub unsafe fn with_layout(
        registry: &'a LayoutRegistry,
        layout: &'a ViewLayout,
        base: Address,
    ) -> Self {
        Self {
            registry,
            layout,
            base,
        }
    }

    pub fn layout(&self) -> &'a ViewLayout {
        self.layout
    }

    pub fn address_of_obj(&self) -> Address {
        self.base
    }

    /// The field named `name`.
    pub fn field(&self, name: &str) -> Result<DynField<'a>> {
        let field = self.layout.field(name).ok_or_else(|| {
            Error(ErrorOrigin::Field, ErrorKind::NotFound)
                .log_debug(format_args!("{}.{}", self.layout.name(), name))
        })?;
        Ok(self.bind(field))
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = DynField<'a>> + '_ {
        self.layout.fields().map(move |field| self.bind(field))
    }

    fn bind(&self, field: &FieldLayout) -> DynField<'a> {
        trace!("binding {}.{}", self.layout.name(), field.name());
        // constructing the view vouched for the base
        unsafe { DynField::bind(self.registry, field, self.base) }
    }
}

/// A member of a dynamic view, or an element reached through one.
#[derive(Clone, Debug)]
pub struct DynField<'a> {
    registry: &'a LayoutRegistry,
    ty: DeclaredType,
    specialization: Specialization,
    binding: Binding,
}

impl<'a> DynField<'a> {
    unsafe fn bind(registry: &'a LayoutRegistry, field: &FieldLayout, base: Address) -> Self {
        trace!("{} at {:x} via {:?}", field.name(), base, field.resolver());
        DynField {
            registry,
            ty: field.rewritten().clone(),
            specialization: field.specialization().clone(),
            binding: Binding::new(Parent::Object(base), field.resolver()),
        }
    }

    /// The rewritten type of the field.
    pub fn ty(&self) -> &DeclaredType {
        &self.ty
    }

    pub fn specialization(&self) -> &Specialization {
        &self.specialization
    }

    pub fn category(&self) -> Category {
        self.specialization.category()
    }

    /// The resolved address of the wrapped storage.
    pub fn address(&self) -> Address {
        self.binding.resolve()
    }

    fn bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.address().as_ptr(), self.specialization.size()) }
    }

    /// Reads the wrapped value.
    pub fn read(&self) -> Result<Value> {
        match self.category() {
            Category::Numeric => {
                let scalar = self.scalar()?;
                Ok(unsafe { Value::read(scalar, self.address()) })
            }
            Category::Pointer => Ok(Value::Pointer(self.pointer_value())),
            Category::Array | Category::Aggregate | Category::WeakView => {
                Ok(Value::Bytes(self.bytes().to_vec()))
            }
            Category::Function => Err(self.not_supported("read")),
        }
    }

    /// Overwrites the wrapped value.
    ///
    /// Numbers are converted into the scalar of numeric fields. Pointer fields accept pointers
    /// and `usize` values, aggregates accept exactly as many bytes as they are large.
    pub fn write(&mut self, value: &Value) -> Result<()> {
        self.specialization.require(Capabilities::ASSIGN)?;
        let value = match self.category() {
            Category::Numeric => value.convert(self.scalar()?)?,
            Category::Pointer => match value {
                Value::Pointer(_) => value.clone(),
                Value::Usize(address) => Value::Pointer(Address::from(*address)),
                _ => return Err(Error(ErrorOrigin::Field, ErrorKind::TypeMismatch)),
            },
            _ => match value {
                Value::Bytes(bytes) if bytes.len() == self.specialization.size() => value.clone(),
                _ => return Err(Error(ErrorOrigin::Field, ErrorKind::TypeMismatch)),
            },
        };
        unsafe { value.write(self.address()) };
        Ok(())
    }

    /// Computes `self op rhs` without writing back.
    pub fn binary(&self, op: BinaryOp, rhs: &Value) -> Result<Value> {
        self.specialization.require(op.capability())?;
        self.read()?.binary(op, rhs)
    }

    /// Computes `self op= rhs`.
    pub fn assign_op(&mut self, op: BinaryOp, rhs: &Value) -> Result<()> {
        self.specialization
            .require(op.capability() | Capabilities::ASSIGN)?;
        let result = self.read()?.binary(op, rhs)?;
        self.write(&result)
    }

    pub fn unary(&self, op: UnaryOp) -> Result<Value> {
        self.specialization.require(op.capability())?;
        self.read()?.unary(op)
    }

    /// Adds one and returns the new value.
    pub fn increment(&mut self) -> Result<Value> {
        self.step(Capabilities::INCREMENT, BinaryOp::Add)
    }

    /// Subtracts one and returns the new value.
    pub fn decrement(&mut self) -> Result<Value> {
        self.step(Capabilities::DECREMENT, BinaryOp::Sub)
    }

    fn step(&mut self, capability: Capabilities, op: BinaryOp) -> Result<Value> {
        self.specialization.require(capability)?;
        let result = self.read()?.binary(op, &Value::U8(1))?;
        self.write(&result)?;
        Ok(result)
    }

    pub fn compare(&self, op: CompareOp, rhs: &Value) -> Result<bool> {
        self.specialization.require(op.capability())?;
        self.read()?.compare(op, rhs)
    }

    /// Evaluates `self && rhs` or `self || rhs` on truthiness.
    pub fn logical(&self, op: LogicalOp, rhs: &Value) -> Result<bool> {
        self.specialization.require(op.capability())?;
        let lhs = self.read()?.is_truthy();
        Ok(match op {
            LogicalOp::And => lhs && rhs.is_truthy(),
            LogicalOp::Or => lhs || rhs.is_truthy(),
        })
    }

    /// The `i`-th element of an array field, or the `i`-th element behind a pointer field.
    ///
    /// Array subscripts are bounds checked. Pointer subscripts are not: the caller vouches for
    /// the memory behind the stored pointer.
    pub fn index(&self, i: usize) -> Result<DynField<'a>> {
        self.specialization.require(Capabilities::SUBSCRIPT)?;
        if let Some(len) = self.specialization.len() {
            if i >= len {
                return Err(Error(ErrorOrigin::Field, ErrorKind::OutOfBounds)
                    .log_debug(format_args!("index {} of {}", i, len)));
            }
        }
        let address = self
            .first_element()
            .wrapping_add(i.wrapping_mul(self.specialization.stride()));
        self.element_at(address)
    }

    /// The element a pointer field points to, or the first element of an array field.
    pub fn indirection(&self) -> Result<DynField<'a>> {
        self.specialization.require(Capabilities::INDIRECTION)?;
        self.element_at(self.first_element())
    }

    /// Pointer arithmetic: the address `count` elements away from the first element.
    pub fn offset(&self, count: isize) -> Result<Value> {
        let capability = if count < 0 {
            Capabilities::POINTER_SUB
        } else {
            Capabilities::POINTER_ADD
        };
        self.specialization.require(capability)?;
        let bytes = count.wrapping_mul(self.specialization.stride() as isize);
        Ok(Value::Pointer(self.first_element().offset(bytes)))
    }

    /// The member `name` of an aggregate field.
    ///
    /// Arrays and pointers over aggregates or views forward to their first element, like `->`
    /// does for pointers.
    pub fn member(&self, name: &str) -> Result<DynField<'a>> {
        self.specialization.require(Capabilities::MEMBER_ACCESS)?;
        if self.category() != Category::Aggregate {
            let element = self.indirection()?;
            return match element.category() {
                Category::WeakView => element.to_strong()?.field(name),
                _ => element.member(name),
            };
        }

        let aggregate = self.ty.base().name();
        let field = self
            .registry
            .aggregate(aggregate)
            .and_then(|layout| layout.field(name))
            .ok_or_else(|| {
                Error(ErrorOrigin::Field, ErrorKind::NotFound)
                    .log_debug(format_args!("{}.{}", aggregate, name))
            })?;
        // the aggregate lives at our address
        Ok(unsafe { DynField::bind(self.registry, field, self.address()) })
    }

    /// Binds the registered view to the location of a weak view field.
    pub fn to_strong(&self) -> Result<DynView<'a>> {
        self.specialization.require(Capabilities::TO_STRONG)?;
        let name = self.ty.base().name();
        let layout = self.registry.view(name).ok_or_else(|| {
            Error(ErrorOrigin::View, ErrorKind::NotFound).log_debug(format_args!("view {}", name))
        })?;
        Ok(unsafe { DynView::with_layout(self.registry, layout, self.address()) })
    }

    /// The address of a weak view field.
    pub fn raw(&self) -> Result<Address> {
        self.specialization.require(Capabilities::RAW_ADDRESS)?;
        Ok(self.address())
    }

    /// The code address of a function field.
    pub fn call_address(&self) -> Result<Address> {
        self.specialization.require(Capabilities::CALL)?;
        Ok(self.address())
    }

    fn scalar(&self) -> Result<crate::decl::Scalar> {
        self.specialization
            .scalar()
            .ok_or(Error(ErrorOrigin::Field, ErrorKind::TypeMismatch))
    }

    fn pointer_value(&self) -> Address {
        unsafe { self.address().read_address() }
    }

    fn first_element(&self) -> Address {
        match self.category() {
            Category::Pointer => self.pointer_value(),
            _ => self.address(),
        }
    }

    fn element_at(&self, address: Address) -> Result<DynField<'a>> {
        let element = self
            .specialization
            .element()
            .ok_or(Error(ErrorOrigin::Field, ErrorKind::TypeMismatch))?;
        let specialization = dispatch(element)?;
        trace!("element {} at {:x}", element, address);
        Ok(DynField {
            registry: self.registry,
            ty: element.clone(),
            specialization,
            binding: unsafe { Binding::absolute(address) },
        })
    }

    fn not_supported(&self, operation: &str) -> Error {
        Error(ErrorOrigin::Field, ErrorKind::NotSupported)
            .log_trace(format_args!("{} on {}", operation, self.ty))
    }
}
