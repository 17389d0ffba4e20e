extern crate proc_macro;
extern crate quote;
extern crate syn;

use proc_macro::TokenStream;
use quote::quote;

/// Derives `emlab::tween::Lerp` for a struct with named fields.
///
/// Every field is blended as `a * (1 - amount) + b * amount`, so each field type must
/// support multiplication by `f64` and addition (`f64`, `Vector3<f64>`, ...).
/// The struct must also implement `Clone`.
#[proc_macro_derive(Lerp)]
pub fn lerp_macro_derive(input: TokenStream) -> TokenStream {
    let ast: syn::DeriveInput = match syn::parse(input) {
        Ok(ast) => ast,
        Err(err) => return err.to_compile_error().into(),
    };
    impl_lerp_macro(&ast)
}

fn impl_lerp_macro(ast: &syn::DeriveInput) -> TokenStream {
    use syn::spanned::Spanned;
    use syn::Fields;

    let name = &ast.ident;
    let named = match &ast.data {
        syn::Data::Struct(struct_data) => match &struct_data.fields {
            Fields::Named(named) => named,
            other => {
                return syn::Error::new(other.span(), "Lerp can only be derived for named fields")
                    .to_compile_error()
                    .into()
            }
        },
        _ => {
            return syn::Error::new(ast.span(), "Lerp can only be derived for structs")
                .to_compile_error()
                .into()
        }
    };

    let mut field_assignment_tokens = quote!();
    for field in named.named.iter() {
        let field_name = field.ident.as_ref();
        field_assignment_tokens.extend(quote!(
            output.#field_name = self.#field_name * (1.0 - amount) + other.#field_name * amount;
        ));
    }

    let tokens = quote! {
        impl Lerp<#name> for #name {
            fn lerp(&self, other: &Self, amount: f64) -> Self {
                let mut output = self.clone();
                #field_assignment_tokens
                output
            }
        }
    };
    tokens.into()
}
