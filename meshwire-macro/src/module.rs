use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, Attribute, ItemStruct, Path, Token, Type,
};

struct ModuleItem {
    attrs: Vec<Attribute>,
    path: Path,
}

impl Parse for ModuleItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let path = input.parse()?;
        Ok(ModuleItem { attrs, path })
    }
}

/// Represents a capability binding: (dyn Trait => Impl)
struct BindingItem {
    trait_type: Type,
    impl_type: Path,
}

impl Parse for BindingItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let content;
        syn::parenthesized!(content in input);

        let trait_type: Type = content.parse()?;
        content.parse::<Token![=>]>()?;
        let impl_type: Path = content.parse()?;

        Ok(BindingItem {
            trait_type,
            impl_type,
        })
    }
}

struct ModuleArgs {
    imports: Vec<ModuleItem>,
    providers: Vec<ModuleItem>,
    bindings: Vec<BindingItem>,
}

impl Parse for ModuleArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut imports = Vec::new();
        let mut providers = Vec::new();
        let mut bindings = Vec::new();

        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            // Parse array: [Item1, Item2, ...]
            let content;
            syn::bracketed!(content in input);

            if name == "imports" {
                let items = content.parse_terminated(ModuleItem::parse, Token![,])?;
                imports = items.into_iter().collect();
            } else if name == "providers" {
                let items = content.parse_terminated(ModuleItem::parse, Token![,])?;
                providers = items.into_iter().collect();
            } else if name == "bindings" {
                let items = content.parse_terminated(BindingItem::parse, Token![,])?;
                bindings = items.into_iter().collect();
            } else {
                return Err(syn::Error::new(
                    name.span(),
                    "expected `imports`, `providers` or `bindings`",
                ));
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(ModuleArgs {
            imports,
            providers,
            bindings,
        })
    }
}

pub fn module_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ModuleArgs);
    let input = parse_macro_input!(item as ItemStruct);
    let expanded = generate_module_impl(&args, &input);

    TokenStream::from(expanded)
}

fn generate_module_impl(args: &ModuleArgs, input: &ItemStruct) -> TokenStream2 {
    let module_name = &input.ident;

    let import_directives = args.imports.iter().map(|item| {
        let path = &item.path;
        let attrs = &item.attrs;
        quote! {
            #(#attrs)*
            directives.push(::meshwire::Directive::package(
                <#path as ::meshwire::Module>::directives()
            ));
        }
    });

    let provider_directives = args.providers.iter().map(|item| {
        let path = &item.path;
        let attrs = &item.attrs;
        quote! {
            #(#attrs)*
            directives.push(::meshwire::Provide::injectable::<#path>().into());
        }
    });

    // Each binding declares the capability cast and binds the provided impl to it
    let binding_directives = args.bindings.iter().map(|binding| {
        let trait_type = &binding.trait_type;
        let impl_type = &binding.impl_type;
        quote! {
            directives.push(
                ::meshwire::Capability::<#trait_type>::new()
                    .implemented_by::<#impl_type>(
                        |it: ::std::sync::Arc<#impl_type>| -> ::std::sync::Arc<#trait_type> { it }
                    )
                    .into()
            );
            directives.push(::meshwire::Bind::new::<#trait_type>().to::<#impl_type>().into());
        }
    });

    quote! {
        #input

        impl ::meshwire::Module for #module_name {
            fn directives() -> ::std::vec::Vec<::meshwire::Directive> {
                #[allow(unused_mut)]
                let mut directives: ::std::vec::Vec<::meshwire::Directive> = ::std::vec::Vec::new();

                // 1. Imported modules
                #(#import_directives)*

                // 2. Providers
                #(#provider_directives)*

                // 3. Capability bindings
                #(#binding_directives)*

                directives
            }
        }

        impl #module_name {
            /// Create a new container from this module
            pub fn create_container() -> ::meshwire::Result<::meshwire::Container> {
                ::meshwire::Container::builder().module::<Self>().build()
            }
        }
    }
}
