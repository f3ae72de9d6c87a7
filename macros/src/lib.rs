//! Test attribute used by the rxdemand test suites.
//!
//! `#[rxdemand_macro::test]` expands to a plain `#[test]` for synchronous
//! functions and to `#[tokio::test]` for `async fn`s. Async tests may pick a
//! runtime flavor: `local` (current thread) or `shared` (multi thread).

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

const USAGE: &str = "rxdemand_macro::test only accepts: #[rxdemand_macro::test], \
                     #[rxdemand_macro::test(local)], #[rxdemand_macro::test(shared)], or string \
                     equivalents";

fn flavor_for(name: &str) -> Option<proc_macro2::TokenStream> {
  match name {
    "local" => Some(quote!(flavor = "current_thread")),
    "shared" => Some(quote!(flavor = "multi_thread")),
    _ => None,
  }
}

#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);

  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let tokio_args = if raw_args.is_empty() {
    proc_macro2::TokenStream::new()
  } else {
    if !is_async {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxdemand_macro::test flavor args are only supported for async tests. Use \
           #[rxdemand_macro::test] for sync tests, or make the function async.",
        )
        .to_compile_error(),
      );
    }

    let (name, span) = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      (ident.to_string(), ident.span())
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      (lit.value(), lit.span())
    } else {
      return TokenStream::from(syn::Error::new(raw_args.span(), USAGE).to_compile_error());
    };

    match flavor_for(&name) {
      Some(flavor) => flavor,
      None => return TokenStream::from(syn::Error::new(span, USAGE).to_compile_error()),
    }
  };

  let attr = if is_async { quote!(#[tokio::test(#tokio_args)]) } else { quote!(#[test]) };

  let expanded = quote! {
      #attr
      #input
  };

  TokenStream::from(expanded)
}
