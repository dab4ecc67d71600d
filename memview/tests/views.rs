use memview::prelude::v1::*;

#[derive(View)]
#[view(size = 0x18)]
struct Node {
    #[field(base)]
    base: Address,
    #[field(offset = 0x0)]
    value: Field<i32>,
    #[field(offset = 0x8)]
    next: Field<Ptr<Node>>,
    #[field(offset = 0x10)]
    kind: Field<Kind>,
    #[field(offset = 0x14)]
    visited: Field<bool>,
}

impl Instantiate for Node {
    fn construct(&mut self) {
        self.value.set(-1);
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Enumeration)]
enum Kind {
    Leaf = 1,
    Branch = 2,
    Root = 0x10,
}

#[test]
fn linked_nodes() {
    let mut tail = Owned::<Node>::new().unwrap();
    assert_eq!(tail.value, -1);
    tail.value += 43;
    tail.kind.set_value(Kind::Leaf);

    let mut head = Owned::<Node>::with(|node| node.value.set(1)).unwrap();
    head.next.point_to(tail.address());
    head.kind.set_value(Kind::Root);

    assert!(!head.next.is_null());
    assert!(tail.next.is_null());

    let next = unsafe { head.next.indirection() }.to_strong();
    assert_eq!(next.address_of_obj(), tail.address());
    assert_eq!(next.value, 42);
    assert!(next.kind == Kind::Leaf);
    assert!(head.kind == Kind::Root);

    // writes through one handle are visible through every other handle
    let mut alias = next;
    alias.visited.set(1);
    assert!(tail.visited.is_truthy());
    assert!(!head.visited.is_truthy());
}

#[test]
fn enumeration_values() {
    let mut node = Owned::<Node>::new().unwrap();
    assert_eq!(node.kind.value(), None);

    node.kind.set_value(Kind::Branch);
    assert_eq!(node.kind.value(), Some(Kind::Branch));
    assert_eq!(node.kind.as_repr().get(), 2);

    node.kind.as_repr().set(0x10);
    assert_eq!(node.kind.value(), Some(Kind::Root));

    node.kind.as_repr().set(3);
    assert_eq!(node.kind.value(), None);
    assert!(node.kind != Kind::Leaf);
}

#[test]
fn enumeration_operators() {
    let mut node = Owned::<Node>::new().unwrap();
    node.kind.set_value(Kind::Leaf);

    assert_eq!(node.kind + 1, 2);
    assert_eq!(node.kind | 0x10, 0x11);
    assert_eq!(node.kind << 4, 0x10);
    assert_eq!(!node.kind, 0xfe);
    assert!(node.kind < Kind::Branch);
    assert!(node.kind.is_truthy());

    node.kind += 1;
    assert_eq!(node.kind.value(), Some(Kind::Branch));
    node.kind ^= 0x12;
    assert_eq!(node.kind.value(), Some(Kind::Root));
}

#[derive(View)]
#[view(size = 0x10)]
struct Item {
    #[field(base)]
    base: Address,
    #[field(offset = 0)]
    id: Field<u32>,
    #[field(offset = 8)]
    weight: Field<f64>,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Aggregate)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(View)]
#[view(size = 0xe0)]
struct Inventory {
    #[field(base)]
    base: Address,
    #[field(offset = 0x0)]
    position: Field<Vec3>,
    #[field(offset = 0x10)]
    items: Field<[Item; 12]>,
    #[field(offset = 0xd0)]
    selected: Field<Ptr<Item>>,
}

impl Instantiate for Inventory {}

#[test]
fn arrays_of_views() {
    assert_eq!(std::mem::size_of::<Weak<Item, 0x10>>(), Item::SIZE);
    assert_eq!(std::mem::size_of::<[Weak<Item, 0x10>; 12]>(), 12 * 0x10);

    let mut inventory = Owned::<Inventory>::new().unwrap();
    assert_eq!(inventory.items.len(), 12);
    assert_eq!(inventory.items.stride(), 0x10);

    for (i, item) in inventory.items.elements().enumerate() {
        let mut item = item.to_strong();
        item.id.set(i as u32 * 10);
        item.weight.set(i as f64 / 2.0);
    }

    let fifth = inventory.items.element(5).to_strong();
    assert_eq!(fifth.address_of_obj(), inventory.address() + 0x10 + 5 * 0x10);
    assert_eq!(fifth.id, 50);
    assert_eq!(fifth.weight, 2.5);

    // the placeholder and the strong view describe the same object
    let weak = &inventory.items[7];
    assert_eq!(weak.raw(), inventory.items.element(7).address());
    assert_eq!(weak.to_strong().id, 70);

    inventory.selected.point_to(fifth.address_of_obj());
    let selected = unsafe { inventory.selected.element(1) }.to_strong();
    assert_eq!(selected.id, 60);

    inventory.selected += 2;
    assert_eq!(unsafe { inventory.selected.indirection() }.to_strong().id, 70);
}

#[test]
#[should_panic]
fn array_bounds() {
    let inventory = Owned::<Inventory>::new().unwrap();
    inventory.items.element(12);
}

#[test]
fn aggregate_members() {
    let mut inventory = Owned::<Inventory>::new().unwrap();
    inventory.position.set(Vec3 {
        x: 1.0,
        y: 2.0,
        z: 3.0,
    });
    inventory.position.y += 0.5;

    assert_eq!(inventory.position.x, 1.0);
    assert_eq!(inventory.position.y, 2.5);
    assert_eq!(
        inventory.position.get(),
        Vec3 {
            x: 1.0,
            y: 2.5,
            z: 3.0
        }
    );
    assert_eq!(
        Field::<Vec3>::specialization().unwrap().category(),
        Category::Aggregate
    );
}

#[repr(C)]
struct RawAnimal {
    header: u64,
    vtable: *const usize,
    legs: u32,
}

extern "C" fn animal_legs(this: *const RawAnimal) -> u32 {
    unsafe { (*this).legs }
}

extern "C" fn animal_walk(this: *mut RawAnimal, steps: u32) -> u32 {
    unsafe {
        (*this).header += steps as u64;
        (*this).header as u32
    }
}

#[derive(View)]
struct Animal {
    #[field(base)]
    base: Address,
    #[field(offset = 0x0)]
    header: Field<u64>,
    #[field(offset = 0x10)]
    legs: Field<u32>,
    #[field(vtable = 0, vtable_offset = 0x8)]
    count_legs: VirtualFunction<extern "C" fn(*const RawAnimal) -> u32>,
    #[field(vtable = 1, vtable_offset = 0x8)]
    walk: VirtualFunction<extern "C" fn(*mut RawAnimal, u32) -> u32>,
}

/// Starts at the leg count, everything else lies in front of it.
#[derive(View)]
struct AnimalTail {
    #[field(base)]
    base: Address,
    #[field(offset = "-0x10")]
    header: Field<u64>,
    #[field(offset = 0)]
    legs: Field<u32>,
}

#[cfg(target_pointer_width = "64")]
#[test]
fn virtual_functions() {
    let vtable = [animal_legs as usize, animal_walk as usize];
    let mut raw = RawAnimal {
        header: 10,
        vtable: vtable.as_ptr(),
        legs: 4,
    };
    let object = Address::from(&mut raw as *mut RawAnimal);

    let mut animal = unsafe { Animal::from_address(object) };
    assert_eq!(animal.header, 10);
    assert_eq!(animal.legs, 4);
    assert_eq!(animal.count_legs.address(), Address::from(animal_legs as usize));
    assert_eq!(animal.walk.this(), object);

    animal.legs.set(6);
    assert_eq!(unsafe { animal.count_legs.call(()) }, 6);
    assert_eq!(unsafe { animal.walk.call((5,)) }, 15);
    assert_eq!(animal.header, 15);

    let tail = unsafe { AnimalTail::from_address(object + 0x10) };
    assert_eq!(tail.header, 15);
    assert_eq!(tail.legs, 6);
    assert_eq!(tail.header.address(), object);
}

#[test]
fn absolute_members() {
    static GLOBAL: [u32; 2] = [7, 9];

    let field = unsafe {
        Field::<[u32; 2]>::new(
            Parent::Root,
            Resolver::absolute(Address::from_ptr(GLOBAL.as_ptr())),
        )
    };
    assert_eq!(field.element(1), 9);
    assert_eq!(field.address(), Address::from_ptr(GLOBAL.as_ptr()));
}

#[test]
fn rebinding_handles() {
    let first = Owned::<Node>::with(|node| node.value.set(1)).unwrap();
    let second = Owned::<Node>::with(|node| node.value.set(2)).unwrap();

    let mut handle = *first;
    handle = *second;
    assert_eq!(handle.value, 2);
    assert_eq!(first.value, 1);
}
