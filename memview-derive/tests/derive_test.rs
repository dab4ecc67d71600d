use memview::prelude::v1::*;

#[derive(View)]
struct Unsized {
    #[field(base)]
    base: Address,
    #[field(offset = 0x10)]
    value: Field<u32>,
}

#[derive(View)]
#[view(size = 0x20)]
struct Linked {
    #[field(base)]
    base: Address,
    #[field(offset = "-0x8")]
    header: Field<u64>,
    #[field(offset = 0x8)]
    next: Field<Ptr<Linked>>,
    #[field(offset = 0x10)]
    inner: Field<Flags>,
    #[field(absolute = 0x1000)]
    global: Field<i32>,
    #[field(vtable = 2, vtable_offset = 0)]
    update: VirtualFunction<extern "C" fn(*const u8, u32) -> u32>,
}

#[derive(View)]
#[view(size = 8)]
struct Flags {
    #[field(base)]
    base: Address,
    #[field(offset = 0)]
    flags: Field<[u8; 8]>,
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Aggregate)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Enumeration)]
enum Kind {
    Empty = 0,
    Leaf = 7,
    Branch,
}

#[derive(View)]
#[view(size = 0x40)]
struct Mixed {
    #[field(base)]
    base: Address,
    #[field(offset = 0)]
    position: Field<Vec3>,
    #[field(offset = 0xc)]
    kind: Field<Kind>,
    #[field(offset = 0x10)]
    children: Field<[Ptr<Mixed>; 4]>,
    #[field(offset = 0x30)]
    callback: Function<extern "C" fn() -> u32>,
}

#[test]
pub fn compiles() {}
