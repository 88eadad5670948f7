use std::collections::HashSet;

/// Resolves names that are defined outside the scanned text.
///
/// The undefined-function rule asks this before reporting a call, so callers
/// decide which ambient environment (browser, Node, a framework) counts as
/// defined.
pub trait KnownSymbols: Send + Sync {
    fn is_known(&self, name: &str) -> bool;
}

/// ECMAScript built-ins plus the common browser and Node globals.
const BUILTIN_GLOBALS: &[&str] = &[
    // language
    "Array", "ArrayBuffer", "BigInt", "Boolean", "DataView", "Date", "Error", "EvalError",
    "Float32Array", "Float64Array", "Function", "Int8Array", "Int16Array", "Int32Array", "Intl",
    "JSON", "Map", "Math", "Number", "Object", "Promise", "Proxy", "RangeError", "ReferenceError",
    "Reflect", "RegExp", "Set", "String", "Symbol", "SyntaxError", "TypeError", "URIError",
    "Uint8Array", "Uint16Array", "Uint32Array", "WeakMap", "WeakRef", "WeakSet",
    "decodeURI", "decodeURIComponent", "encodeURI", "encodeURIComponent", "eval", "globalThis",
    "isFinite", "isNaN", "parseFloat", "parseInt",
    // browser
    "alert", "atob", "btoa", "cancelAnimationFrame", "clearInterval", "clearTimeout", "confirm",
    "console", "document", "fetch", "getComputedStyle", "localStorage", "location", "navigator",
    "prompt", "queueMicrotask", "requestAnimationFrame", "sessionStorage", "setInterval",
    "setTimeout", "structuredClone", "window", "AbortController", "Blob", "CustomEvent", "Event",
    "FileReader", "FormData", "Headers", "Image", "IntersectionObserver", "MutationObserver",
    "Request", "Response", "URL", "URLSearchParams", "WebSocket", "Worker", "XMLHttpRequest",
    // node
    "Buffer", "clearImmediate", "exports", "global", "module", "process", "require",
    "setImmediate",
];

/// A fixed set of ambient global names.
#[derive(Debug, Clone, Default)]
pub struct AmbientGlobals {
    names: HashSet<String>,
}

impl AmbientGlobals {
    pub fn builtin() -> Self {
        Self::default().with_names(BUILTIN_GLOBALS.iter().copied())
    }

    /// Add names to the set (e.g. from the `globals` config key).
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl KnownSymbols for AmbientGlobals {
    fn is_known(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}
