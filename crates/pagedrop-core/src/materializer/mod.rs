//! Blob materialization: the in-page half of the bridge.
//!
//! A `blob:` locator only exists inside the page, so the page itself must read
//! the bytes. The install script defines one idempotent `handle(url)` on
//! `window.__pagedrop` and calls it from three places: capture-phase clicks on
//! links and buttons, `location.assign`, and navigations the host intercepted
//! (via [`MaterializerScript::materialize`]). `handle` fetches the blob, reads
//! it as a data URL, swaps the preamble for the fixed content type and calls
//! `persistEncodedPayload` on the bridge. The page never writes storage.

mod payload;

pub use payload::{encode_data_uri, EncodedPayload};

use crate::config::PagedropConfig;

const INSTALL_TEMPLATE: &str = r#"(function () {
  if (window.__pagedrop && window.__pagedrop.installed) {
    return;
  }
  var BRIDGE = __BRIDGE__;
  var MIME = __MIME__;
  var BASE_NAME = __BASE_NAME__;
  var EXTENSION = __EXTENSION__;

  function invoke(method, args, message) {
    var bridge = window[BRIDGE];
    if (bridge && typeof bridge[method] === "function") {
      bridge[method].apply(bridge, args);
      return;
    }
    if (window.ipc && typeof window.ipc.postMessage === "function") {
      window.ipc.postMessage(JSON.stringify(message));
      return;
    }
    console.error("pagedrop: no native bridge for " + method);
  }

  function notice(text) {
    invoke("showNotice", [text], { call: "showNotice", message: text });
  }

  function isBlob(url) {
    return typeof url === "string" && url.trim().toLowerCase().indexOf("blob:") === 0;
  }

  function fail(err) {
    var message = err && err.message ? err.message : String(err);
    console.error("pagedrop: blob download failed", err);
    notice("Error processing download: " + message);
  }

  function handle(url) {
    if (!isBlob(url)) {
      return false;
    }
    try {
      fetch(url)
        .then(function (response) { return response.blob(); })
        .then(function (blob) {
          var reader = new FileReader();
          reader.onload = function () {
            var result = String(reader.result);
            var body = result.substring(result.indexOf(",") + 1);
            var payload = "data:" + MIME + ";base64," + body;
            var filename = BASE_NAME + "_" + Date.now() + EXTENSION;
            invoke("persistEncodedPayload", [payload, filename], {
              call: "persistEncodedPayload",
              payloadDataUri: payload,
              filename: filename
            });
          };
          reader.onerror = function () { fail(reader.error); };
          reader.readAsDataURL(blob);
        })
        .catch(fail);
    } catch (e) {
      fail(e);
    }
    return true;
  }

  try {
    document.addEventListener("click", function (e) {
      var target = e.target && e.target.closest ? e.target.closest("a, button") : null;
      if (!target) {
        return;
      }
      var href = target.href || target.getAttribute("data-href");
      if (isBlob(href)) {
        e.preventDefault();
        e.stopImmediatePropagation();
        notice("Processing download...");
        handle(href);
      }
    }, true);
  } catch (e) {}

  function wrapAssign(orig) {
    return function (url) {
      var target = String(url);
      if (isBlob(target)) {
        notice("Processing download...");
        handle(target);
      } else {
        orig.call(this, url);
      }
    };
  }

  var patched = false;
  try {
    var d = Object.getOwnPropertyDescriptor(Location.prototype, "assign");
    if (d && typeof d.value === "function" && d.configurable) {
      Object.defineProperty(Location.prototype, "assign", {
        value: wrapAssign(d.value),
        writable: d.writable,
        enumerable: d.enumerable,
        configurable: true
      });
      patched = true;
    }
  } catch (e) {}
  if (!patched) {
    try {
      window.location.assign = wrapAssign(window.location.assign);
    } catch (e) {}
  }

  window.__pagedrop = { installed: true, handle: handle };
  console.log("pagedrop: blob interception installed");
})();"#;

/// Generates the page scripts for one bridge configuration.
#[derive(Debug, Clone)]
pub struct MaterializerScript {
    install: String,
}

impl MaterializerScript {
    pub fn new(cfg: &PagedropConfig) -> Self {
        let doc = cfg.primary_document_type();
        let install = INSTALL_TEMPLATE
            .replace("__BRIDGE__", &js_string(&cfg.bridge_name))
            .replace("__MIME__", &js_string(&doc.mime))
            .replace("__BASE_NAME__", &js_string(&cfg.naming.blob_base_name))
            .replace("__EXTENSION__", &js_string(&doc.dotted_extension()));
        Self { install }
    }

    /// Script evaluated when a page finishes loading. Safe to evaluate repeatedly.
    pub fn install(&self) -> &str {
        &self.install
    }

    /// Script that materializes one intercepted blob locator, installing the
    /// helper first when the page has not finished loading yet.
    pub fn materialize(&self, url: &str) -> String {
        format!(
            "{}\nwindow.__pagedrop && window.__pagedrop.handle({});",
            self.install,
            js_string(url)
        )
    }
}

/// JavaScript string literal for `s` (JSON encoding; quotes and `</script>` safe).
fn js_string(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_script_carries_configuration() {
        let script = MaterializerScript::new(&PagedropConfig::default());
        let js = script.install();
        assert!(js.contains(r#"var BRIDGE = "Android";"#));
        assert!(js.contains(r#"var MIME = "application/pdf";"#));
        assert!(js.contains(r#"var BASE_NAME = "relatorio_safeprag";"#));
        assert!(js.contains(r#"var EXTENSION = ".pdf";"#));
        assert!(!js.contains("__BRIDGE__"));
        assert!(!js.contains("__MIME__"));
    }

    #[test]
    fn install_script_registers_all_trigger_points_once() {
        let script = MaterializerScript::new(&PagedropConfig::default());
        let js = script.install();
        assert_eq!(js.matches("function handle(url)").count(), 1);
        assert!(js.contains("document.addEventListener(\"click\""));
        assert!(js.contains("Location.prototype, \"assign\""));
        assert!(js.contains("window.__pagedrop.installed"));
        assert!(js.contains("\"persistEncodedPayload\""));
        assert!(js.contains("result.indexOf(\",\") + 1"));
    }

    #[test]
    fn materialize_embeds_locator_as_literal() {
        let script = MaterializerScript::new(&PagedropConfig::default());
        let js = script.materialize("blob:https://app.example/abc-123");
        assert!(js.ends_with(r#"window.__pagedrop.handle("blob:https://app.example/abc-123");"#));

        let hostile = script.materialize("blob:x');alert(1);//\"</script>");
        assert!(hostile.contains(r#"handle("blob:x');alert(1);//\"<\/script>");"#));
    }

    #[test]
    fn custom_bridge_name_is_escaped() {
        let mut cfg = PagedropConfig::default();
        cfg.bridge_name = "Na\"tive".to_string();
        let script = MaterializerScript::new(&cfg);
        assert!(script.install().contains(r#"var BRIDGE = "Na\"tive";"#));
    }
}
