use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

const USAGE: &str = "rxstream_macro::test only accepts: #[rxstream_macro::test] or \
                     #[rxstream_macro::test(paused)] (string form \"paused\" is also accepted)";

/// Test attribute used across the crate.
///
/// Sync tests become `#[test]`; async tests run on a current-thread tokio
/// runtime so `tokio::task::LocalSet` can drive `!Send` work. The `paused`
/// flavor starts the tokio clock paused, which makes timer based tests
/// deterministic.
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
          "rxstream_macro::test flavor args are only supported for async tests. Use \
           #[rxstream_macro::test] for sync tests, or make the function async.",
        )
        .to_compile_error(),
      );
    }

    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      (ident.to_string(), ident.span())
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      (lit.value(), lit.span())
    } else {
      return TokenStream::from(syn::Error::new(raw_args.span(), USAGE).to_compile_error());
    };

    match flavor.0.as_str() {
      "paused" => quote!(start_paused = true),
      _ => return TokenStream::from(syn::Error::new(flavor.1, USAGE).to_compile_error()),
    }
  };

  let wasm_attr = if is_async {
    quote!(wasm_bindgen_test::wasm_bindgen_test(async))
  } else {
    quote!(wasm_bindgen_test::wasm_bindgen_test)
  };

  let native_attr = if is_async { quote!(tokio::test(#tokio_args)) } else { quote!(test) };

  let expanded = quote! {
      #[cfg_attr(target_arch = "wasm32", #wasm_attr)]
      #[cfg_attr(not(target_arch = "wasm32"), #native_attr)]
      #input
  };

  TokenStream::from(expanded)
}
