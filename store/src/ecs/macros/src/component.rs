use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

pub fn derive_component(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let ast = parse_macro_input!(input as DeriveInput);

    // Get the struct name we are annotating, keeping any generics intact.
    let struct_name = &ast.ident;
    let (impl_generics, type_generics, where_clause) = ast.generics.split_for_impl();

    // Use ::rusty_store::ecs::Component which works both inside and outside the crate.
    // Inside the crate, this works because of `extern crate self as rusty_store;` in lib.rs
    // Outside the crate, this naturally resolves to the rusty_store dependency.
    TokenStream::from(quote! {
        impl #impl_generics ::rusty_store::ecs::Component for #struct_name #type_generics #where_clause {
        }
    })
}
