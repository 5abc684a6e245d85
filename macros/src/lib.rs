//! Derive macros for the live todo view-model
//!
//! This crate provides procedural macros to reduce boilerplate in action
//! enums and view state structs.
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Classifies action variants as user intents or effect feedback
//! - `#[derive(State)]` - Generates loading/error accessors for view state
//!
//! # Example
//!
//! ```ignore
//! use live_todo_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum TodoAction {
//!     #[intent]
//!     DeleteTodo { id: String },
//!
//!     #[feedback]
//!     TodoDeleted { id: String },
//! }
//!
//! // Generated methods:
//! assert!(TodoAction::DeleteTodo { id: "1".into() }.is_intent());
//! assert!(TodoAction::TodoDeleted { id: "1".into() }.is_feedback());
//! assert_eq!(TodoAction::TodoDeleted { id: "1".into() }.name(), "TodoDeleted");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, Variant};

/// Derive macro for Action enums
///
/// Generates helper methods for action enums:
/// - `is_intent()` - Returns true if the variant was triggered by the user
/// - `is_feedback()` - Returns true if the variant is produced by an effect
/// - `name()` - Returns the variant name, for logs and metric labels
///
/// # Attributes
///
/// - `#[intent]` - Mark a variant as a user intent
/// - `#[feedback]` - Mark a variant as effect feedback
///
/// Unmarked variants are neither.
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - A variant has both `#[intent]` and `#[feedback]` attributes
#[proc_macro_derive(Action, attributes(intent, feedback))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut intent_arms = Vec::new();
    let mut feedback_arms = Vec::new();
    let mut name_arms = Vec::new();

    for variant in &data_enum.variants {
        let is_intent = has_attribute(&variant.attrs, "intent");
        let is_feedback = has_attribute(&variant.attrs, "feedback");

        if is_intent && is_feedback {
            return syn::Error::new_spanned(
                variant,
                "Variant cannot be both #[intent] and #[feedback]",
            )
            .to_compile_error()
            .into();
        }

        let pattern = variant_pattern(variant);
        if is_intent {
            intent_arms.push(quote! { #pattern => true, });
        }
        if is_feedback {
            feedback_arms.push(quote! { #pattern => true, });
        }

        let label = variant.ident.to_string();
        name_arms.push(quote! { #pattern => #label, });
    }

    // An enum without variants has no arms; the wildcard keeps matches exhaustive.
    let expanded = quote! {
        impl #name {
            /// Returns true if this action is a user intent
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_intent(&self) -> bool {
                match self {
                    #(#intent_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action is feedback from an effect
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_feedback(&self) -> bool {
                match self {
                    #(#feedback_arms)*
                    _ => false,
                }
            }

            /// Returns the variant name
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn name(&self) -> &'static str {
                match self {
                    #(#name_arms)*
                    _ => "unknown",
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Derive macro for view State structs
///
/// Generates accessors for the fields marked with:
///
/// - `#[loading]` on a `bool` field: `is_loading()` and `set_loading(bool)`
/// - `#[last_error]` on an `Option<String>` field: `error()`,
///   `record_error(message)` and `clear_error()`
///
/// When both markers are present, `record_error` also clears the loading
/// flag, so a failed load never leaves the view spinning.
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-struct type or a tuple struct
/// - A marker is used on more than one field
///
/// # Example
///
/// ```ignore
/// use live_todo_macros::State;
///
/// #[derive(State, Clone, Debug, Default)]
/// struct ListState {
///     pub items: Vec<String>,
///     #[loading]
///     pub is_loading: bool,
///     #[last_error]
///     pub error: Option<String>,
/// }
/// ```
#[proc_macro_derive(State, attributes(loading, last_error))]
pub fn derive_state(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Struct(data_struct) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(State)] can only be used on structs")
            .to_compile_error()
            .into();
    };

    let Fields::Named(fields) = &data_struct.fields else {
        return syn::Error::new_spanned(input, "#[derive(State)] requires named fields")
            .to_compile_error()
            .into();
    };

    let loading = match marked_field(fields.named.iter(), "loading") {
        Ok(field) => field,
        Err(error) => return error.to_compile_error().into(),
    };
    let last_error = match marked_field(fields.named.iter(), "last_error") {
        Ok(field) => field,
        Err(error) => return error.to_compile_error().into(),
    };

    let loading_impl = loading.map_or_else(TokenStream2::new, |field| {
        quote! {
            /// Returns true while a load is in flight
            #[must_use]
            pub const fn is_loading(&self) -> bool {
                self.#field
            }

            /// Set the loading flag
            pub fn set_loading(&mut self, loading: bool) {
                self.#field = loading;
            }
        }
    });

    let error_impl = last_error.map_or_else(TokenStream2::new, |field| {
        let stop_loading = loading.map_or_else(TokenStream2::new, |loading_field| {
            quote! { self.#loading_field = false; }
        });
        quote! {
            /// The last recorded error message, if any
            #[must_use]
            pub fn error(&self) -> Option<&str> {
                self.#field.as_deref()
            }

            /// Record an error message, replacing any previous one
            pub fn record_error(&mut self, message: impl Into<String>) {
                self.#field = Some(message.into());
                #stop_loading
            }

            /// Forget the last error
            pub fn clear_error(&mut self) {
                self.#field = None;
            }
        }
    });

    let expanded = quote! {
        impl #name {
            #loading_impl
            #error_impl
        }
    };

    TokenStream::from(expanded)
}

/// Match pattern for a variant, ignoring its fields
fn variant_pattern(variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    match &variant.fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

/// The single field carrying `#[marker]`, if any
fn marked_field<'a>(
    fields: impl Iterator<Item = &'a syn::Field>,
    marker: &str,
) -> syn::Result<Option<&'a Ident>> {
    let mut found: Option<&'a syn::Field> = None;
    for field in fields.filter(|field| has_attribute(&field.attrs, marker)) {
        if found.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                format!("#[{marker}] can only mark one field"),
            ));
        }
        found = Some(field);
    }
    Ok(found.and_then(|field| field.ident.as_ref()))
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
