//! Lexical binding resolution.
//!
//! Walks a program once, keeping a stack of scopes the way the hoisting rules
//! of JavaScript define them, and records for every identifier occurrence the
//! declaration it refers to. Identifiers that resolve to nothing (globals such
//! as `require`) are not recorded.

use std::collections::HashMap;

use swc_common::{BytePos, Span};
use swc_ecma_ast::{
    ArrowExpr, BindingIdent, BlockStmt, BlockStmtOrExpr, BreakStmt, CatchClause, ClassDecl,
    ClassExpr, Constructor, ContinueStmt, Decl, DefaultDecl, FnDecl, FnExpr, ForHead, ForInStmt,
    ForOfStmt, ForStmt, Function, GetterProp, Ident, ImportDecl, ImportSpecifier, LabeledStmt,
    Module, ModuleDecl, ModuleItem, NamedExport, ObjectPatProp, ParamOrTsParamProp, Pat, Program,
    Script, SetterProp, Stmt, TsImportEqualsDecl, TsInterfaceDecl, TsModuleName, TsParamPropParam,
    TsType, TsTypeAliasDecl, TsTypeAnn, TsTypeParamDecl, TsTypeParamInstantiation, VarDecl,
    VarDeclKind, VarDeclOrExpr,
};
use swc_ecma_visit::{Visit, VisitWith};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(usize);

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    /// Span of the identifier that declares the binding.
    pub span: Span,
}

/// One occurrence of an identifier that refers to a binding.
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    pub binding: BindingId,
    pub span: Span,
    pub is_write: bool,
}

/// Bindings and references of one program.
#[derive(Debug, Default)]
pub struct ScopeAnalysis {
    bindings: Vec<Binding>,
    /// Declaring identifier position -> binding.
    declarations: HashMap<BytePos, BindingId>,
    /// Reading identifier position -> binding.
    reads: HashMap<BytePos, BindingId>,
    references: Vec<Reference>,
}

impl ScopeAnalysis {
    pub fn analyze(program: &Program) -> Self {
        let mut analysis = Self::default();
        let mut resolver = Resolver {
            analysis: &mut analysis,
            scopes: Vec::new(),
        };
        program.visit_with(&mut resolver);
        analysis
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0]
    }

    /// The binding `ident` declares, if it is a declaration.
    pub fn declared_by(&self, ident: &Ident) -> Option<BindingId> {
        self.declarations.get(&ident.span.lo).copied()
    }

    /// The binding `ident` reads, if it is a resolved read reference.
    pub fn resolve(&self, ident: &Ident) -> Option<BindingId> {
        self.reads.get(&ident.span.lo).copied()
    }

    /// All read references to `binding`, in source order.
    pub fn read_references(&self, binding: BindingId) -> impl Iterator<Item = &Reference> {
        self.references
            .iter()
            .filter(move |r| r.binding == binding && !r.is_write)
    }
}

/// Identifiers bound by a pattern.
pub fn binding_idents(pat: &Pat) -> Vec<&Ident> {
    match pat {
        Pat::Ident(binding) => vec![&binding.id],
        Pat::Object(obj) => obj
            .props
            .iter()
            .flat_map(|prop| match prop {
                ObjectPatProp::KeyValue(kv) => binding_idents(&kv.value),
                ObjectPatProp::Assign(assign) => vec![&assign.key.id],
                ObjectPatProp::Rest(rest) => binding_idents(&rest.arg),
            })
            .collect(),
        Pat::Array(arr) => arr
            .elems
            .iter()
            .flatten()
            .flat_map(binding_idents)
            .collect(),
        Pat::Assign(assign) => binding_idents(&assign.left),
        Pat::Rest(rest) => binding_idents(&rest.arg),
        _ => vec![],
    }
}

/// Collects `var` declarations of a function body, without entering nested
/// functions, classes, or expressions (which cannot contain statements other
/// than through functions).
#[derive(Default)]
struct VarCollector {
    idents: Vec<Ident>,
}

impl Visit for VarCollector {
    fn visit_var_decl(&mut self, node: &VarDecl) {
        if node.kind == VarDeclKind::Var {
            for decl in &node.decls {
                self.idents
                    .extend(binding_idents(&decl.name).into_iter().cloned());
            }
        }
    }

    fn visit_function(&mut self, _: &Function) {}
    fn visit_class(&mut self, _: &swc_ecma_ast::Class) {}
    fn visit_expr(&mut self, _: &swc_ecma_ast::Expr) {}
}

struct Resolver<'a> {
    analysis: &'a mut ScopeAnalysis,
    scopes: Vec<HashMap<String, BindingId>>,
}

impl Resolver<'_> {
    fn with_scope<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.scopes.push(HashMap::new());
        f(self);
        self.scopes.pop();
    }

    fn declare(&mut self, ident: &Ident) {
        let name = ident.sym.as_str();
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        let id = match scope.get(name) {
            // `var` redeclarations and function/var pairs share one binding.
            Some(id) => *id,
            None => {
                let id = BindingId(self.analysis.bindings.len());
                self.analysis.bindings.push(Binding {
                    name: name.to_string(),
                    span: ident.span,
                });
                scope.insert(name.to_string(), id);
                id
            }
        };
        self.analysis.declarations.insert(ident.span.lo, id);
    }

    fn declare_pat(&mut self, pat: &Pat) {
        for ident in binding_idents(pat) {
            self.declare(ident);
        }
    }

    fn declare_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Class(class) => self.declare(&class.ident),
            Decl::Fn(func) => self.declare(&func.ident),
            Decl::Var(var) if var.kind != VarDeclKind::Var => {
                for declarator in &var.decls {
                    self.declare_pat(&declarator.name);
                }
            }
            Decl::TsEnum(ts_enum) => self.declare(&ts_enum.id),
            Decl::TsModule(ts_module) => {
                if let TsModuleName::Ident(id) = &ts_module.id {
                    self.declare(id);
                }
            }
            _ => {}
        }
    }

    /// Declare the block-scoped names of a statement list.
    fn declare_lexical(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let Stmt::Decl(decl) = stmt {
                self.declare_decl(decl);
            }
        }
    }

    /// Declare the function-scoped `var` names of a statement list.
    fn hoist_vars<'n, I, N>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = &'n N>,
        N: VisitWith<VarCollector> + 'n,
    {
        let mut collector = VarCollector::default();
        for node in nodes {
            node.visit_with(&mut collector);
        }
        for ident in &collector.idents {
            self.declare(ident);
        }
    }

    fn declare_function_body(&mut self, body: &BlockStmt) {
        self.hoist_vars(&body.stmts);
        self.declare_lexical(&body.stmts);
    }

    fn declare_module_items(&mut self, items: &[ModuleItem]) {
        for item in items {
            match item {
                ModuleItem::Stmt(Stmt::Decl(decl)) => self.declare_decl(decl),
                ModuleItem::Stmt(_) => {}
                ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                    for specifier in &import.specifiers {
                        match specifier {
                            ImportSpecifier::Named(s) => self.declare(&s.local),
                            ImportSpecifier::Default(s) => self.declare(&s.local),
                            ImportSpecifier::Namespace(s) => self.declare(&s.local),
                        }
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    self.declare_decl(&export.decl)
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                    match &export.decl {
                        DefaultDecl::Fn(FnExpr {
                            ident: Some(id), ..
                        }) => self.declare(id),
                        DefaultDecl::Class(ClassExpr {
                            ident: Some(id), ..
                        }) => self.declare(id),
                        _ => {}
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::TsImportEquals(decl)) => self.declare(&decl.id),
                ModuleItem::ModuleDecl(_) => {}
            }
        }
        self.hoist_vars(items);
    }

    fn lookup(&self, name: &str) -> Option<BindingId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn reference(&mut self, ident: &Ident, is_write: bool) {
        let Some(binding) = self.lookup(ident.sym.as_str()) else {
            return;
        };
        if self.analysis.declarations.get(&ident.span.lo) == Some(&binding) {
            return;
        }
        if !is_write {
            self.analysis.reads.insert(ident.span.lo, binding);
        }
        self.analysis.references.push(Reference {
            binding,
            span: ident.span,
            is_write,
        });
    }
}

impl Visit for Resolver<'_> {
    fn visit_module(&mut self, node: &Module) {
        self.with_scope(|this| {
            this.declare_module_items(&node.body);
            node.body.visit_with(this);
        });
    }

    fn visit_script(&mut self, node: &Script) {
        self.with_scope(|this| {
            this.hoist_vars(&node.body);
            this.declare_lexical(&node.body);
            node.body.visit_with(this);
        });
    }

    fn visit_function(&mut self, node: &Function) {
        node.decorators.visit_with(self);
        self.with_scope(|this| {
            for param in &node.params {
                this.declare_pat(&param.pat);
            }
            if let Some(body) = &node.body {
                this.declare_function_body(body);
            }
            node.params.visit_with(this);
            if let Some(body) = &node.body {
                body.stmts.visit_with(this);
            }
        });
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        self.with_scope(|this| {
            for param in &node.params {
                this.declare_pat(param);
            }
            if let BlockStmtOrExpr::BlockStmt(body) = &*node.body {
                this.declare_function_body(body);
            }
            node.params.visit_with(this);
            match &*node.body {
                BlockStmtOrExpr::BlockStmt(body) => body.stmts.visit_with(this),
                BlockStmtOrExpr::Expr(expr) => expr.visit_with(this),
            }
        });
    }

    fn visit_constructor(&mut self, node: &Constructor) {
        node.key.visit_with(self);
        self.with_scope(|this| {
            for param in &node.params {
                match param {
                    ParamOrTsParamProp::Param(param) => this.declare_pat(&param.pat),
                    ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                        TsParamPropParam::Ident(binding) => this.declare(&binding.id),
                        TsParamPropParam::Assign(assign) => this.declare_pat(&assign.left),
                    },
                }
            }
            if let Some(body) = &node.body {
                this.declare_function_body(body);
            }
            node.params.visit_with(this);
            if let Some(body) = &node.body {
                body.stmts.visit_with(this);
            }
        });
    }

    fn visit_getter_prop(&mut self, node: &GetterProp) {
        node.key.visit_with(self);
        self.with_scope(|this| {
            if let Some(body) = &node.body {
                this.declare_function_body(body);
                body.stmts.visit_with(this);
            }
        });
    }

    fn visit_setter_prop(&mut self, node: &SetterProp) {
        node.key.visit_with(self);
        self.with_scope(|this| {
            this.declare_pat(&node.param);
            if let Some(body) = &node.body {
                this.declare_function_body(body);
            }
            node.param.visit_with(this);
            if let Some(body) = &node.body {
                body.stmts.visit_with(this);
            }
        });
    }

    fn visit_block_stmt(&mut self, node: &BlockStmt) {
        self.with_scope(|this| {
            this.declare_lexical(&node.stmts);
            node.stmts.visit_with(this);
        });
    }

    fn visit_for_stmt(&mut self, node: &ForStmt) {
        self.with_scope(|this| {
            if let Some(VarDeclOrExpr::VarDecl(var)) = &node.init
                && var.kind != VarDeclKind::Var
            {
                for declarator in &var.decls {
                    this.declare_pat(&declarator.name);
                }
            }
            node.visit_children_with(this);
        });
    }

    fn visit_for_in_stmt(&mut self, node: &ForInStmt) {
        self.with_scope(|this| {
            this.declare_for_head(&node.left);
            node.visit_children_with(this);
        });
    }

    fn visit_for_of_stmt(&mut self, node: &ForOfStmt) {
        self.with_scope(|this| {
            this.declare_for_head(&node.left);
            node.visit_children_with(this);
        });
    }

    fn visit_catch_clause(&mut self, node: &CatchClause) {
        self.with_scope(|this| {
            if let Some(param) = &node.param {
                this.declare_pat(param);
            }
            node.visit_children_with(this);
        });
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        node.function.visit_with(self);
    }

    fn visit_fn_expr(&mut self, node: &FnExpr) {
        self.with_scope(|this| {
            if let Some(ident) = &node.ident {
                this.declare(ident);
            }
            node.function.visit_with(this);
        });
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        node.class.visit_with(self);
    }

    fn visit_class_expr(&mut self, node: &ClassExpr) {
        self.with_scope(|this| {
            if let Some(ident) = &node.ident {
                this.declare(ident);
            }
            node.class.visit_with(this);
        });
    }

    fn visit_labeled_stmt(&mut self, node: &LabeledStmt) {
        node.body.visit_with(self);
    }

    fn visit_break_stmt(&mut self, _: &BreakStmt) {}
    fn visit_continue_stmt(&mut self, _: &ContinueStmt) {}

    fn visit_import_decl(&mut self, _: &ImportDecl) {}
    fn visit_ts_import_equals_decl(&mut self, _: &TsImportEqualsDecl) {}

    fn visit_named_export(&mut self, node: &NamedExport) {
        // Re-exports from another module name no local binding.
        if node.src.is_none() {
            node.visit_children_with(self);
        }
    }

    // Types never reference value bindings we care about.
    fn visit_ts_type(&mut self, _: &TsType) {}
    fn visit_ts_type_ann(&mut self, _: &TsTypeAnn) {}
    fn visit_ts_type_param_decl(&mut self, _: &TsTypeParamDecl) {}
    fn visit_ts_type_param_instantiation(&mut self, _: &TsTypeParamInstantiation) {}
    fn visit_ts_interface_decl(&mut self, _: &TsInterfaceDecl) {}
    fn visit_ts_type_alias_decl(&mut self, _: &TsTypeAliasDecl) {}

    fn visit_binding_ident(&mut self, node: &BindingIdent) {
        self.reference(&node.id, true);
    }

    fn visit_ident(&mut self, node: &Ident) {
        self.reference(node, false);
    }
}

impl Resolver<'_> {
    fn declare_for_head(&mut self, head: &ForHead) {
        if let ForHead::VarDecl(var) = head
            && var.kind != VarDeclKind::Var
        {
            for declarator in &var.decls {
                self.declare_pat(&declarator.name);
            }
        }
    }
}
