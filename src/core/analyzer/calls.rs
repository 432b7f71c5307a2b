use std::collections::HashSet;

use swc_common::{BytePos, Spanned};
use swc_ecma_ast::{
    ArrayLit, CallExpr, Callee, Expr, ExprOrSpread, Lit, MemberExpr, MemberProp, ObjectLit, Pat,
    Prop, PropName, PropOrSpread, Str, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::bundle::KeyInfo;
use crate::core::analyzer::{AnalysisError, AnalysisErrorKind, Context, unescape_message, unparen};
use crate::core::patch::Patch;
use crate::core::scope::BindingId;
use crate::core::text::Span;

const LOAD_MESSAGE_BUNDLE: &str = "loadMessageBundle";
const CONFIG: &str = "config";

/// A validated localize call.
pub(super) struct LocalizeCall {
    pub key: KeyInfo,
    pub key_span: Span,
    pub message: String,
    pub message_span: Span,
}

/// A localize call site, ordered by `start`.
pub(super) struct CallSite {
    pub start: BytePos,
    pub outcome: Result<LocalizeCall, AnalysisError>,
}

impl Context<'_> {
    fn call_site(&self, call: &CallExpr) -> CallSite {
        CallSite {
            start: call.span.lo,
            outcome: self.localize_call(call),
        }
    }

    fn localize_call(&self, call: &CallExpr) -> Result<LocalizeCall, AnalysisError> {
        let key_arg = plain_arg(call, 0)
            .ok_or_else(|| self.error(AnalysisErrorKind::InvalidKey, call.span.lo))?;
        let key = self.key_info(key_arg)?;

        let message_arg = plain_arg(call, 1)
            .ok_or_else(|| self.error(AnalysisErrorKind::InvalidMessage, call.span.lo))?;
        let Expr::Lit(Lit::Str(message)) = message_arg else {
            return Err(self.error(AnalysisErrorKind::InvalidMessage, message_arg.span().lo));
        };

        Ok(LocalizeCall {
            key,
            key_span: self.span(key_arg.span()),
            message: unescape_message(self.raw_contents(message)),
            message_span: self.span(message.span),
        })
    }

    fn key_info(&self, expr: &Expr) -> Result<KeyInfo, AnalysisError> {
        let invalid = || self.error(AnalysisErrorKind::InvalidKey, expr.span().lo);
        match expr {
            Expr::Lit(Lit::Str(s)) => string_value(s).map(KeyInfo::Key).ok_or_else(invalid),
            Expr::Object(obj) => self.structured_key(obj)?.ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }

    /// `{ key: '...', comment: ['...'] }`. `Ok(None)` when `key` is missing.
    fn structured_key(&self, obj: &ObjectLit) -> Result<Option<KeyInfo>, AnalysisError> {
        let mut key = None;
        let mut comment = Vec::new();

        for prop in &obj.props {
            let PropOrSpread::Prop(prop) = prop else {
                continue;
            };
            let Prop::KeyValue(kv) = &**prop else {
                continue;
            };
            match prop_name(&kv.key) {
                Some("key") => match &*kv.value {
                    Expr::Lit(Lit::Str(s)) => key = string_value(s),
                    other => {
                        return Err(self.error(AnalysisErrorKind::InvalidKey, other.span().lo));
                    }
                },
                Some("comment") => {
                    comment = match &*kv.value {
                        Expr::Array(array) => string_array(array),
                        _ => None,
                    }
                    .ok_or_else(|| {
                        self.error(AnalysisErrorKind::InvalidComment, kv.value.span().lo)
                    })?;
                }
                _ => {}
            }
        }

        Ok(key.map(|key| KeyInfo::Commented { key, comment }))
    }

    /// Source text of a string literal between its quotes.
    fn raw_contents(&self, s: &Str) -> &str {
        let raw = self.parsed.slice(s.span);
        if raw.len() >= 2 {
            &raw[1..raw.len() - 1]
        } else {
            ""
        }
    }
}

/// The `index`-th argument, unless missing or spread.
fn plain_arg(call: &CallExpr, index: usize) -> Option<&Expr> {
    match call.args.get(index) {
        Some(ExprOrSpread { spread: None, expr }) => Some(expr),
        _ => None,
    }
}

fn string_value(s: &Str) -> Option<String> {
    s.value.as_str().map(str::to_string)
}

fn prop_name(name: &PropName) -> Option<&str> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.as_str()),
        PropName::Str(s) => s.value.as_str(),
        _ => None,
    }
}

fn string_array(array: &ArrayLit) -> Option<Vec<String>> {
    array
        .elems
        .iter()
        .map(|elem| match elem {
            Some(ExprOrSpread {
                spread: None,
                expr,
            }) => match &**expr {
                Expr::Lit(Lit::Str(s)) => string_value(s),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

fn escape_single_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Output of [`LoadCallCollector`].
pub(super) struct LoadCalls {
    /// Patches filling empty load call argument lists.
    pub patches: Vec<Patch>,
    /// Variables initialized with a load call.
    pub localize_bindings: Vec<BindingId>,
    /// Localize calls made directly on a load call.
    pub sites: Vec<CallSite>,
}

/// Finds `b.loadMessageBundle(...)` and `b.config(...)(...)` where `b` is one
/// of the given import references.
pub(super) struct LoadCallCollector<'a> {
    cx: &'a Context<'a>,
    import_refs: &'a HashSet<BytePos>,
    relative_filename: Option<&'a str>,
    out: LoadCalls,
}

impl<'a> LoadCallCollector<'a> {
    pub(super) fn collect(
        cx: &'a Context<'a>,
        import_refs: &'a HashSet<BytePos>,
        relative_filename: Option<&'a str>,
    ) -> LoadCalls {
        let mut collector = Self {
            cx,
            import_refs,
            relative_filename,
            out: LoadCalls {
                patches: Vec::new(),
                localize_bindings: Vec::new(),
                sites: Vec::new(),
            },
        };
        cx.parsed.program.visit_with(&mut collector);
        collector.out
    }

    fn is_import_member(&self, member: &MemberExpr, method: &str) -> bool {
        matches!(&member.prop, MemberProp::Ident(name) if name.sym.as_str() == method)
            && matches!(unparen(&member.obj), Expr::Ident(obj) if self.import_refs.contains(&obj.span.lo))
    }

    fn is_load_call(&self, call: &CallExpr) -> bool {
        let Callee::Expr(callee) = &call.callee else {
            return false;
        };
        match unparen(callee) {
            Expr::Member(member) => self.is_import_member(member, LOAD_MESSAGE_BUNDLE),
            Expr::Call(config) => match &config.callee {
                Callee::Expr(config_callee) => matches!(
                    unparen(config_callee),
                    Expr::Member(member) if self.is_import_member(member, CONFIG)
                ),
                _ => false,
            },
            _ => false,
        }
    }

    /// Fill the empty argument list of a load call with the file reference.
    fn patch_arguments(&mut self, call: &CallExpr) {
        if !call.args.is_empty() {
            return;
        }
        let text = self.cx.parsed.text();
        let end = self.cx.parsed.offset(call.span.hi);
        let callee_end = self.cx.parsed.offset(call.callee.span().hi);
        if end == 0 || callee_end >= end || text.as_bytes()[end - 1] != b')' {
            return;
        }
        let close = end - 1;
        let Some(open) = text[callee_end..close].rfind('(') else {
            return;
        };

        let content = match self.relative_filename {
            Some(relative) => format!(
                "require('path').join(__dirname, '{}')",
                escape_single_quoted(relative)
            ),
            None => "__filename".to_string(),
        };
        self.out.patches.push(Patch::new(
            self.cx.index.span_of(callee_end + open + 1, close),
            content,
        ));
    }
}

impl Visit for LoadCallCollector<'_> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if self.is_load_call(node) {
            self.patch_arguments(node);
        } else if let Callee::Expr(callee) = &node.callee
            && let Expr::Call(load) = unparen(callee)
            && self.is_load_call(load)
        {
            self.out.sites.push(self.cx.call_site(node));
        }
        node.visit_children_with(self);
    }

    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if let Pat::Ident(name) = &node.name
            && let Some(init) = &node.init
            && let Expr::Call(call) = unparen(init)
            && self.is_load_call(call)
            && let Some(binding) = self.cx.scope.declared_by(&name.id)
        {
            self.out.localize_bindings.push(binding);
        }
        node.visit_children_with(self);
    }
}

/// Output of [`BoundCallCollector`].
pub(super) struct BoundCalls {
    pub sites: Vec<CallSite>,
    /// Reference positions that are the callee of a localize call.
    pub used: HashSet<BytePos>,
}

/// Finds `localize(key, message, ...)` where `localize` is a variable
/// initialized with a load call.
pub(super) struct BoundCallCollector<'a> {
    cx: &'a Context<'a>,
    bindings: HashSet<BindingId>,
    out: BoundCalls,
}

impl<'a> BoundCallCollector<'a> {
    pub(super) fn collect(cx: &'a Context<'a>, bindings: &[BindingId]) -> BoundCalls {
        let mut collector = Self {
            cx,
            bindings: bindings.iter().copied().collect(),
            out: BoundCalls {
                sites: Vec::new(),
                used: HashSet::new(),
            },
        };
        if !collector.bindings.is_empty() {
            cx.parsed.program.visit_with(&mut collector);
        }
        collector.out
    }
}

impl Visit for BoundCallCollector<'_> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if node.args.len() >= 2
            && let Callee::Expr(callee) = &node.callee
            && let Expr::Ident(ident) = unparen(callee)
            && let Some(binding) = self.cx.scope.resolve(ident)
            && self.bindings.contains(&binding)
        {
            self.out.used.insert(ident.span.lo);
            self.out.sites.push(self.cx.call_site(node));
        }
        node.visit_children_with(self);
    }
}
