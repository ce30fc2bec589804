use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Error, Fields, ItemStruct};

/// Splits a node declaration into a shared handle and its payload.
///
/// `struct Node { .. }` becomes `Node` (a strong `meshui::mrc::Mrc` handle
/// that dereferences to the payload), `NodeWeak` (the parent-side back
/// reference) and `NodeData` (the declared fields). Only named fields are
/// accepted. Callers inside the crate need `use crate as meshui;`.
#[proc_macro_attribute]
pub fn mrc_object(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as ItemStruct);
    if !matches!(item.fields, Fields::Named(_)) {
        return Error::new_spanned(&item.ident, "mrc_object needs named fields")
            .to_compile_error()
            .into();
    }
    let ItemStruct { attrs, vis, ident, fields, .. } = item;
    let weak_ident = format_ident!("{}Weak", ident);
    let data_ident = format_ident!("{}Data", ident);

    let handle = quote! {
        #(#attrs)*
        #[derive(Clone, PartialEq)]
        #vis struct #ident {
            handle: meshui::mrc::Mrc<#data_ident>,
        }

        impl #ident {
            pub fn as_weak(&self) -> #weak_ident {
                #weak_ident { handle: self.handle.as_weak() }
            }
        }

        impl std::ops::Deref for #ident {
            type Target = meshui::mrc::Mrc<#data_ident>;

            fn deref(&self) -> &Self::Target {
                &self.handle
            }
        }

        impl std::ops::DerefMut for #ident {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.handle
            }
        }
    };

    let weak = quote! {
        #[derive(Clone)]
        #vis struct #weak_ident {
            handle: meshui::mrc::MrcWeak<#data_ident>,
        }

        impl #weak_ident {
            pub fn upgrade(&self) -> Result<#ident, meshui::mrc::UpgradeError> {
                self.handle.upgrade().map(|handle| #ident { handle })
            }
        }
    };

    quote! {
        #handle
        #weak
        #vis struct #data_ident #fields
    }
    .into()
}
