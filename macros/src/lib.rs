//! Test attribute used across the `reactive-streams` test suites.
//!
//! `#[reactive_streams_macro::test]` expands to `#[test]` for plain functions
//! and to `#[tokio::test]` for `async fn`s. Async tests may pick the runtime
//! flavor: `local` for the current-thread runtime, `shared` for the
//! multi-thread runtime that asynchronous publishers are usually tested on.
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

const USAGE: &str = "reactive_streams_macro::test only accepts: \
                     #[reactive_streams_macro::test], #[reactive_streams_macro::test(local)], \
                     #[reactive_streams_macro::test(shared)], or string equivalents";

fn flavor(name: &str) -> Option<proc_macro2::TokenStream> {
  match name {
    "local" => Some(quote!(flavor = "current_thread")),
    "shared" => Some(quote!(flavor = "multi_thread", worker_threads = 2)),
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
          "reactive_streams_macro::test flavor args are only supported for async tests",
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

    match flavor(&name) {
      Some(args) => args,
      None => return TokenStream::from(syn::Error::new(span, USAGE).to_compile_error()),
    }
  };

  let attr = if is_async { quote!(#[tokio::test(#tokio_args)]) } else { quote!(#[test]) };

  TokenStream::from(quote! {
      #attr
      #input
  })
}
