use darling::ast::{Data, Style};
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, DeriveInput, Generics, Ident, Type};

#[derive(FromDeriveInput)]
#[darling(attributes(inject), supports(struct_named, struct_unit))]
struct InjectableInput {
    ident: Ident,
    generics: Generics,
    data: Data<(), InjectableField>,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectableField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    default: bool,
}

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match InjectableInput::from_derive_input(&input) {
        Ok(parsed) => TokenStream::from(generate_injectable_impl(&parsed)),
        Err(error) => TokenStream::from(error.write_errors()),
    }
}

fn generate_injectable_impl(input: &InjectableInput) -> TokenStream2 {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(fields) => fields,
        Data::Enum(_) => unreachable!("darling rejects enums for this derive"),
    };

    let injected: Vec<_> = fields.iter().filter(|field| !field.default).collect();

    let dependency_keys = injected.iter().map(|field| {
        let ty = &field.ty;
        let name = field.name.clone().unwrap_or_default();
        quote! {
            ::meshwire::Key::new(<#ty as ::meshwire::Dependency>::type_info(), #name)
        }
    });

    // Arguments arrive in the same order as `dependencies()` lists them.
    let takes = injected.iter().map(|field| {
        let ty = &field.ty;
        let binding = binding_ident(field);
        quote! {
            let #binding = arguments.take::<#ty>()?;
        }
    });

    let construct = match fields.style {
        Style::Unit => quote!(Self),
        _ => {
            let initializers = fields.iter().map(|field| {
                let field_name = &field.ident;
                if field.default {
                    quote!(#field_name: ::std::default::Default::default())
                } else {
                    let binding = binding_ident(field);
                    quote!(#field_name: #binding)
                }
            });
            quote!(Self { #(#initializers),* })
        }
    };

    quote! {
        impl #impl_generics ::meshwire::Injectable for #struct_name #ty_generics #where_clause {
            fn dependencies() -> ::std::vec::Vec<::meshwire::Key> {
                ::std::vec![#(#dependency_keys),*]
            }

            fn inject(
                arguments: &mut ::meshwire::Arguments
            ) -> ::meshwire::Result<Self> {
                #(#takes)*
                ::std::result::Result::Ok(#construct)
            }
        }
    }
}

fn binding_ident(field: &InjectableField) -> Ident {
    match &field.ident {
        Some(ident) => format_ident!("__{}", ident),
        None => format_ident!("__field"),
    }
}
