//! Procedural macros for tui-lifecycle

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Action)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_any))]
struct ActionOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<ActionVariant, ()>,

    /// Category for every variant that does not name its own
    #[darling(default)]
    category: Option<String>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Explicit category
    #[darling(default)]
    category: Option<String>,

    /// Opt out of the container category
    #[darling(default)]
    uncategorized: bool,
}

impl ActionVariant {
    fn pattern(&self, name: &syn::Ident) -> proc_macro2::TokenStream {
        let variant = &self.ident;
        match self.fields.style {
            darling::ast::Style::Unit => quote! { #name::#variant },
            darling::ast::Style::Tuple => quote! { #name::#variant(..) },
            darling::ast::Style::Struct => quote! { #name::#variant { .. } },
        }
    }

    fn resolve_category<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        if self.uncategorized {
            return None;
        }
        self.category.as_deref().or(fallback)
    }
}

/// Derive macro for the Action trait
///
/// Generates a `name()` method that returns the variant name as a static string.
///
/// When the enum or any of its variants carries `#[action(category = "...")]`,
/// `ActionCategory` is implemented as well. A variant category overrides the
/// enum-level one; `#[action(uncategorized)]` opts a variant out.
///
/// # Example
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// enum CounterAction {
///     #[action(category = "count")]
///     Increment,
///     #[action(category = "count")]
///     Decrement,
///     Tick,
/// }
///
/// assert_eq!(CounterAction::Increment.name(), "Increment");
/// assert_eq!(CounterAction::Decrement.category(), Some("count"));
/// assert_eq!(CounterAction::Tick.category(), None);
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Action can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let name_arms = variants.iter().map(|v| {
        let pattern = v.pattern(name);
        let variant_str = v.ident.to_string();
        quote! { #pattern => #variant_str }
    });

    let mut expanded = quote! {
        impl #impl_generics tui_lifecycle::Action for #name #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms,)*
                }
            }
        }
    };

    let fallback = opts.category.as_deref();
    let categorized = fallback.is_some() || variants.iter().any(|v| v.category.is_some());

    if categorized {
        let category_arms = variants.iter().map(|v| {
            let pattern = v.pattern(name);
            match v.resolve_category(fallback) {
                Some(category) => quote! { #pattern => ::core::option::Option::Some(#category) },
                None => quote! { #pattern => ::core::option::Option::None },
            }
        });

        expanded.extend(quote! {
            impl #impl_generics tui_lifecycle::ActionCategory for #name #ty_generics #where_clause {
                fn category(&self) -> ::core::option::Option<&'static str> {
                    match self {
                        #(#category_arms,)*
                    }
                }
            }
        });
    }

    TokenStream::from(expanded)
}
