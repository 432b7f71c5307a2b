//! Bindings of the localization module.
//!
//! Recognized forms, for module `m`:
//!
//! ```text
//! const b = require('m');
//! const b = __importStar(require('m'));        // also `tslib.__importStar(...)`
//! import * as b from 'm';
//! import b = require('m');
//! ```

use swc_ecma_ast::{
    CallExpr, Callee, Expr, ImportDecl, ImportSpecifier, Lit, MemberProp, Pat, Program,
    TsImportEqualsDecl, TsModuleRef, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::analyzer::unparen;
use crate::core::scope::{BindingId, ScopeAnalysis};

const IMPORT_STAR_HELPER: &str = "__importStar";

pub(super) fn find_imports(
    program: &Program,
    scope: &ScopeAnalysis,
    module_name: &str,
) -> Vec<BindingId> {
    let mut collector = ImportCollector {
        scope,
        module_name,
        bindings: Vec::new(),
    };
    program.visit_with(&mut collector);
    collector.bindings
}

struct ImportCollector<'a> {
    scope: &'a ScopeAnalysis,
    module_name: &'a str,
    bindings: Vec<BindingId>,
}

impl ImportCollector<'_> {
    fn push(&mut self, binding: Option<BindingId>) {
        if let Some(binding) = binding
            && !self.bindings.contains(&binding)
        {
            self.bindings.push(binding);
        }
    }

    /// `require('m')` with `require` not shadowed by a local binding.
    fn is_require_call(&self, call: &CallExpr) -> bool {
        let Callee::Expr(callee) = &call.callee else {
            return false;
        };
        let Expr::Ident(ident) = unparen(callee) else {
            return false;
        };
        if ident.sym.as_str() != "require" || self.scope.resolve(ident).is_some() {
            return false;
        }
        match call.args.as_slice() {
            [arg] if arg.spread.is_none() => matches!(
                &*arg.expr,
                Expr::Lit(Lit::Str(s)) if s.value.as_str() == Some(self.module_name)
            ),
            _ => false,
        }
    }

    /// `__importStar(require('m'))` or `helpers.__importStar(require('m'))`.
    fn is_import_star_call(&self, call: &CallExpr) -> bool {
        let Callee::Expr(callee) = &call.callee else {
            return false;
        };
        let is_helper = match unparen(callee) {
            Expr::Ident(ident) => ident.sym.as_str() == IMPORT_STAR_HELPER,
            Expr::Member(member) => {
                matches!(&member.prop, MemberProp::Ident(name) if name.sym.as_str() == IMPORT_STAR_HELPER)
            }
            _ => false,
        };
        if !is_helper {
            return false;
        }
        match call.args.as_slice() {
            [arg] if arg.spread.is_none() => {
                matches!(unparen(&arg.expr), Expr::Call(inner) if self.is_require_call(inner))
            }
            _ => false,
        }
    }
}

impl Visit for ImportCollector<'_> {
    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if let Pat::Ident(name) = &node.name
            && let Some(init) = &node.init
            && let Expr::Call(call) = unparen(init)
            && (self.is_require_call(call) || self.is_import_star_call(call))
        {
            self.push(self.scope.declared_by(&name.id));
        }
        node.visit_children_with(self);
    }

    fn visit_import_decl(&mut self, node: &ImportDecl) {
        if node.type_only || node.src.value.as_str() != Some(self.module_name) {
            return;
        }
        for specifier in &node.specifiers {
            if let ImportSpecifier::Namespace(namespace) = specifier {
                self.push(self.scope.declared_by(&namespace.local));
            }
        }
    }

    fn visit_ts_import_equals_decl(&mut self, node: &TsImportEqualsDecl) {
        if node.is_type_only {
            return;
        }
        if let TsModuleRef::TsExternalModuleRef(module_ref) = &node.module_ref
            && module_ref.expr.value.as_str() == Some(self.module_name)
        {
            self.push(self.scope.declared_by(&node.id));
        }
    }
}
