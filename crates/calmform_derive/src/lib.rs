use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(FormModel, attributes(form))]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let calmform = calmform_path();
    let mut key_methods = Vec::new();
    let mut defaults = Vec::new();
    let mut readers = Vec::new();

    for field in &named_fields {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = match field_name(field, field_ident) {
            Ok(name) => name,
            Err(error) => return error.to_compile_error().into(),
        };

        key_methods.push(quote! {
            pub const fn #field_ident(&self) -> #calmform::form::FieldKey {
                #calmform::form::FieldKey::new(#field_name)
            }
        });
        defaults.push(quote! {
            (
                #calmform::form::FieldKey::new(#field_name),
                #calmform::form::FieldValue::from(self.#field_ident),
            )
        });
        readers.push(quote! {
            #field_ident: #calmform::form::compat::read_model_field(
                values,
                #calmform::form::FieldKey::new(#field_name),
            )?
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#key_methods)*
        }

        impl #calmform::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn into_defaults(
                self,
            ) -> ::std::vec::Vec<(#calmform::form::FieldKey, #calmform::form::FieldValue)> {
                ::std::vec![#(#defaults),*]
            }

            fn from_values(
                values: &#calmform::form::FormValues,
            ) -> #calmform::form::FormResult<Self> {
                ::std::result::Result::Ok(Self {
                    #(#readers),*
                })
            }
        }
    }
    .into()
}

/// The form-facing name: `#[form(rename = "...")]` or the Rust identifier.
fn field_name(field: &Field, ident: &Ident) -> syn::Result<String> {
    let mut name = ident.to_string();
    for attr in &field.attrs {
        if !attr.path().is_ident("form") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                name = value.value();
                Ok(())
            } else {
                Err(meta.error("unsupported form attribute, expected `rename`"))
            }
        })?;
    }
    Ok(name)
}

fn calmform_path() -> TokenStream2 {
    match crate_name("calmform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::calmform),
    }
}
