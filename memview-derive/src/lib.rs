use darling::FromMeta;
use proc_macro::TokenStream;
use proc_macro2::Literal;
use proc_macro_crate::*;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, Meta, NestedMeta};

#[derive(Debug, Default, FromMeta)]
struct ViewArgs {
    #[darling(default)]
    size: Option<Number>,
}

#[derive(Debug, Default, FromMeta)]
struct FieldArgs {
    #[darling(default)]
    base: bool,
    #[darling(default)]
    offset: Option<Number>,
    #[darling(default)]
    absolute: Option<Number>,
    #[darling(default)]
    vtable: Option<Number>,
    #[darling(default)]
    vtable_offset: Option<Number>,
}

/// An integer attribute value. Strings allow negative and `_` separated values.
#[derive(Debug, Clone, Copy)]
struct Number(i128);

impl FromMeta for Number {
    fn from_value(value: &Lit) -> darling::Result<Self> {
        match value {
            Lit::Int(lit) => lit
                .base10_parse::<i128>()
                .map(Number)
                .map_err(|err| darling::Error::custom(err).with_span(lit)),
            Lit::Str(lit) => parse_number(&lit.value())
                .map(Number)
                .ok_or_else(|| darling::Error::custom("expected an integer").with_span(lit)),
            _ => Err(darling::Error::unexpected_lit_type(value)),
        }
    }
}

fn parse_number(text: &str) -> Option<i128> {
    let text: String = text.chars().filter(|c| *c != '_' && !c.is_whitespace()).collect();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text.as_str()),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i128>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

impl Number {
    fn signed(self) -> proc_macro2::TokenStream {
        let magnitude = Literal::u128_unsuffixed(self.0.unsigned_abs());
        if self.0 < 0 {
            quote!(-#magnitude)
        } else {
            quote!(#magnitude)
        }
    }

    fn unsigned(self, span: &dyn quote::ToTokens) -> syn::Result<proc_macro2::TokenStream> {
        if self.0 < 0 {
            return Err(syn::Error::new_spanned(span, "value must not be negative"));
        }
        let value = Literal::u128_unsuffixed(self.0 as u128);
        Ok(quote!(#value))
    }
}

/// Parses every `#[name(...)]` attribute into `T`.
fn parse_args<T: FromMeta + Default>(attrs: &[syn::Attribute], name: &str) -> syn::Result<T> {
    let mut nested = Vec::<NestedMeta>::new();
    for attr in attrs.iter().filter(|attr| attr.path.is_ident(name)) {
        match attr.parse_meta()? {
            Meta::List(list) => nested.extend(list.nested.into_iter()),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    format!("expected #[{}(...)]", name),
                ))
            }
        }
    }
    if nested.is_empty() {
        return Ok(T::default());
    }
    T::from_list(&nested).map_err(|err| syn::Error::new(proc_macro2::Span::call_site(), err))
}

/// Auto derive the `View` trait for structs with named fields.
///
/// One member must be an `Address` marked with `#[field(base)]`, it receives the base address of
/// the view. Every other member is bound through its `#[field(...)]` attribute, which names
/// exactly one resolver:
///
/// * `offset = n`: the member lives `n` bytes after the base. Negative offsets are written as
///   strings, `offset = "-0x10"`.
/// * `absolute = p`: the member lives at the fixed address `p`.
/// * `vtable = i` with an optional `vtable_offset = o`: the member is slot `i` of the virtual
///   table whose pointer is stored `o` bytes after the base.
///
/// With `#[view(size = N)]` the view also implements `SizedView` and `Declare`, which makes it
/// usable as a member type of other views. Its storage is a weak view of exactly `N` bytes.
///
/// `Clone` and `Copy` are implemented as well. Copying a view copies its bindings only.
#[proc_macro_derive(View, attributes(view, field))]
pub fn view_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_view(&input) {
        Ok(gen) => gen.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_view(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let crate_path = crate_path();
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "views can not be generic",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "views require named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(input, "views must be structs")),
    };

    let view_args: ViewArgs = parse_args(&input.attrs, "view")?;

    let mut base_field = None;
    let mut members = Vec::new();
    for field in fields.iter() {
        let ident = field.ident.as_ref().expect("named field");
        let args: FieldArgs = parse_args(&field.attrs, "field")?;

        if args.base {
            if base_field.replace(ident).is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one member can be marked #[field(base)]",
                ));
            }
            members.push(quote!(#ident: address));
            continue;
        }

        let resolver = match (args.offset, args.absolute, args.vtable) {
            (Some(offset), None, None) if args.vtable_offset.is_none() => {
                let offset = offset.signed();
                quote!(#crate_path::resolver::Resolver::Offset(#offset))
            }
            (None, Some(absolute), None) if args.vtable_offset.is_none() => {
                let absolute = absolute.unsigned(field)?;
                quote!(#crate_path::resolver::Resolver::Absolute(
                    #crate_path::types::Address::from(#absolute as usize)
                ))
            }
            (None, None, Some(index)) => {
                let index = index.unsigned(field)?;
                let vtable_offset = args.vtable_offset.unwrap_or(Number(0)).signed();
                quote!(#crate_path::resolver::Resolver::VirtualTable {
                    index: #index,
                    vtable_offset: #vtable_offset,
                })
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    field,
                    "members require exactly one of #[field(base)], #[field(offset = ..)], \
                     #[field(absolute = ..)] or #[field(vtable = ..)]",
                ))
            }
        };

        let ty = &field.ty;
        members.push(quote!(
            #ident: <#ty as #crate_path::view::Member>::bind(parent, #resolver)
        ));
    }

    let base_field = base_field.ok_or_else(|| {
        syn::Error::new_spanned(
            input,
            "views require an `Address` member marked #[field(base)]",
        )
    })?;

    let sized_gen = match view_args.size {
        Some(size) => {
            let size = size.unsigned(input)?;
            quote!(
                impl #crate_path::view::SizedView for #name {
                    const SIZE: usize = #size;
                }

                unsafe impl #crate_path::view::Declare for #name {
                    type Storage = #crate_path::view::Weak<#name, #size>;

                    fn declared() -> #crate_path::decl::DeclaredType {
                        #crate_path::decl::DeclaredType::Base(
                            #crate_path::decl::BaseType::view(stringify!(#name), Some(#size)),
                        )
                    }
                }

                const _: () = assert!(
                    ::core::mem::size_of::<#crate_path::view::Weak<#name, #size>>() == #size
                );
            )
        }
        None => quote!(),
    };

    Ok(quote!(
        unsafe impl #crate_path::view::View for #name {
            #[allow(unused_unsafe, unused_variables)]
            unsafe fn from_address(address: #crate_path::types::Address) -> Self {
                let parent = #crate_path::view::Parent::Object(address);
                Self {
                    #(#members,)*
                }
            }

            fn address_of_obj(&self) -> #crate_path::types::Address {
                self.#base_field
            }
        }

        impl ::core::clone::Clone for #name {
            #[inline(always)]
            fn clone(&self) -> Self {
                *self
            }
        }

        impl ::core::marker::Copy for #name {}

        #sized_gen
    ))
}

/// Auto derive `Declare` and `Aggregate` for plain structs.
///
/// The struct must implement `Copy` and `Pod`. Fields of an aggregate type forward member access
/// to the foreign storage through `Deref` / `DerefMut`.
#[proc_macro_derive(Aggregate)]
pub fn aggregate_derive(input: TokenStream) -> TokenStream {
    let crate_path = crate_path();

    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "aggregates can not be generic")
            .to_compile_error()
            .into();
    }
    if !matches!(input.data, Data::Struct(_)) {
        return syn::Error::new_spanned(&input, "aggregates must be structs")
            .to_compile_error()
            .into();
    }

    let gen = quote!(
        unsafe impl #crate_path::view::Declare for #name {
            type Storage = Self;

            fn declared() -> #crate_path::decl::DeclaredType {
                #crate_path::decl::DeclaredType::Base(#crate_path::decl::BaseType::aggregate(
                    stringify!(#name),
                    ::core::mem::size_of::<Self>(),
                    ::core::mem::align_of::<Self>(),
                ))
            }
        }

        unsafe impl #crate_path::view::Aggregate for #name {}

        const _: fn() = || {
            fn assert_pod<T: #crate_path::dataview::Pod>() {}
            assert_pod::<#name>();
        };
    );

    gen.into()
}

const REPRS: [(&str, &str); 10] = [
    ("u8", "U8"),
    ("u16", "U16"),
    ("u32", "U32"),
    ("u64", "U64"),
    ("usize", "Usize"),
    ("i8", "I8"),
    ("i16", "I16"),
    ("i32", "I32"),
    ("i64", "I64"),
    ("isize", "Isize"),
];

/// Auto derive `Declare` and `Enumeration` for fieldless enums with an integer `#[repr]`.
///
/// Fields of the enumeration are stored as the underlying integer. Reading one back yields
/// `None` for values that match no variant.
#[proc_macro_derive(Enumeration)]
pub fn enumeration_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_enumeration(&input) {
        Ok(gen) => gen.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_enumeration(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let crate_path = crate_path();
    let name = &input.ident;

    let data = match &input.data {
        Data::Enum(data) => data,
        _ => return Err(syn::Error::new_spanned(input, "enumerations must be enums")),
    };

    let mut repr = None;
    for attr in input.attrs.iter().filter(|attr| attr.path.is_ident("repr")) {
        if let Meta::List(list) = attr.parse_meta()? {
            for nested in list.nested.iter() {
                if let NestedMeta::Meta(Meta::Path(path)) = nested {
                    if let Some(found) = REPRS.iter().find(|(ty, _)| path.is_ident(ty)) {
                        repr = Some(*found);
                    }
                }
            }
        }
    }
    let (repr, scalar) = repr.ok_or_else(|| {
        syn::Error::new_spanned(input, "enumerations require an integer #[repr(..)]")
    })?;
    let repr = format_ident!("{}", repr);
    let scalar = format_ident!("{}", scalar);

    let mut variants = Vec::new();
    for variant in data.variants.iter() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "enumeration variants can not have fields",
            ));
        }
        variants.push(&variant.ident);
    }

    Ok(quote!(
        unsafe impl #crate_path::view::Declare for #name {
            type Storage = #repr;

            fn declared() -> #crate_path::decl::DeclaredType {
                #crate_path::decl::DeclaredType::Base(#crate_path::decl::BaseType::enumeration(
                    stringify!(#name),
                    #crate_path::decl::Scalar::#scalar,
                ))
            }
        }

        unsafe impl #crate_path::view::Enumeration for #name {
            type Repr = #repr;

            fn from_repr(repr: #repr) -> ::core::option::Option<Self> {
                #(
                    if repr == #name::#variants as #repr {
                        return ::core::option::Option::Some(#name::#variants);
                    }
                )*
                ::core::option::Option::None
            }

            fn to_repr(self) -> #repr {
                self as #repr
            }
        }

        impl ::core::cmp::PartialEq<#name> for #crate_path::view::Field<#name> {
            fn eq(&self, other: &#name) -> bool {
                self.as_repr().get() == #crate_path::view::Enumeration::to_repr(*other)
            }
        }
    ))
}

/// Auto derive the `Pod` trait for structs.
///
/// The type is checked for requirements of the `Pod` trait:
///
/// * Be annotated with `repr(C)` or `repr(transparent)`.
///
/// * Have every field's type implement `Pod` itself.
///
/// * Not have any padding between its fields.
///
/// # Remarks:
/// This custom derive macro is required because the dataview proc macro searches for ::dataview::derive_pod!().
#[proc_macro_derive(Pod)]
pub fn pod_derive(input: TokenStream) -> TokenStream {
    let crate_path = crate_path();

    format!("{}::dataview::derive_pod!{{ {} }}", crate_path, input)
        .parse()
        .unwrap()
}

fn crate_path() -> proc_macro2::TokenStream {
    let (col, ident) = crate_path_ident();
    quote!(#col #ident)
}

fn crate_path_ident() -> (Option<syn::token::Colon2>, proc_macro2::Ident) {
    match crate_path_fixed() {
        FoundCrate::Itself => (None, format_ident!("crate")),
        FoundCrate::Name(name) => (Some(Default::default()), format_ident!("{}", name)),
    }
}

fn crate_path_fixed() -> FoundCrate {
    let found_crate = crate_name("memview").expect("memview found in `Cargo.toml`");

    match found_crate {
        FoundCrate::Itself => {
            let has_doc_env = std::env::vars().any(|(k, _)| {
                k == "UNSTABLE_RUSTDOC_TEST_LINE" || k == "UNSTABLE_RUSTDOC_TEST_PATH"
            });
            // integration tests and benches of the memview package are separate crates
            let foreign_target = std::env::var("CARGO_CRATE_NAME")
                .map(|name| name != "memview")
                .unwrap_or(false);

            if has_doc_env || foreign_target {
                FoundCrate::Name("memview".to_string())
            } else {
                FoundCrate::Itself
            }
        }
        x => x,
    }
}
