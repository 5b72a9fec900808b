//! C/C++ translation units built from tree-sitter parse trees.
//!
//! Parsing produces the declaration tree, the name nodes owned by each
//! declaration and a binding for every name the resolver can pin down.
//! Resolution runs in two passes. The first walks the tree, opens scopes and
//! binds declaration names. The second resolves uses, which may refer to
//! class or namespace members declared further down the file.

use super::preproc::{self, MacroValues};
use super::scope::{NameSpace, ScopeId, ScopeKind, Scopes};
use crate::ast::{FileLocation, TranslationUnit};
use crate::error::{Result, XrefError};
use crate::ingest::detect::Language;
use ropey::Rope;
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Node;

/// Bounds typedef chains followed when computing the class an object's
/// declared type names.
const MAX_ALIAS_DEPTH: usize = 8;

/// Options for [`CppUnit::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CppOptions {
    /// Grammar to parse with.
    pub language: Language,

    /// Index files with syntax errors using tree-sitter's recovered tree.
    /// When off, any syntax error fails the parse.
    pub error_recovery: bool,

    /// Report declaration-use names among a binding's references.
    pub declarations_as_references: bool,
}

impl Default for CppOptions {
    fn default() -> Self {
        Self {
            language: Language::Cpp,
            error_recovery: true,
            declarations_as_references: false,
        }
    }
}

/// Declaration handle of a [`CppUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CppDecl(usize);

/// Name handle of a [`CppUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CppName(usize);

/// Binding handle of a [`CppUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CppBinding(usize);

impl CppBinding {
    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// Kinds of C/C++ symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CppSymbolKind {
    /// Namespace.
    Namespace,
    /// Class.
    Class,
    /// Struct.
    Struct,
    /// Union.
    Union,
    /// Enum.
    Enum,
    /// Enumerator (enum value).
    Enumerator,
    /// Function or method.
    Function,
    /// Variable.
    Variable,
    /// Field/member variable.
    Field,
    /// Function parameter.
    Parameter,
    /// Typedef or alias declaration.
    TypeAlias,
    /// Template type parameter.
    TemplateParameter,
    /// Preprocessor macro.
    Macro,
}

impl CppSymbolKind {
    /// Convert to string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            CppSymbolKind::Namespace => "namespace",
            CppSymbolKind::Class => "class",
            CppSymbolKind::Struct => "struct",
            CppSymbolKind::Union => "union",
            CppSymbolKind::Enum => "enum",
            CppSymbolKind::Enumerator => "enumerator",
            CppSymbolKind::Function => "function",
            CppSymbolKind::Variable => "variable",
            CppSymbolKind::Field => "field",
            CppSymbolKind::Parameter => "parameter",
            CppSymbolKind::TypeAlias => "type_alias",
            CppSymbolKind::TemplateParameter => "template_parameter",
            CppSymbolKind::Macro => "macro",
        }
    }
}

#[derive(Debug)]
struct DeclNode {
    kind: &'static str,
    nested: Vec<CppDecl>,
    names: Vec<CppName>,
    active: bool,
}

#[derive(Debug)]
struct NameNode {
    text: String,
    location: Option<FileLocation>,
    declaration: bool,
    binding: Option<CppBinding>,
}

#[derive(Debug)]
struct BindingNode {
    name: String,
    kind: CppSymbolKind,
    /// Scope holding the members of a namespace, class or enum.
    member_scope: Option<ScopeId>,
    /// Declared type of a variable, field, parameter or typedef.
    type_ref: Option<TypeRef>,
    /// Member scope of the class `type_ref` names.
    type_scope: Option<ScopeId>,
}

/// A parsed C or C++ file with resolved bindings.
#[derive(Debug)]
pub struct CppUnit {
    language: Language,
    top_level: Vec<CppDecl>,
    decls: Vec<DeclNode>,
    names: Vec<NameNode>,
    bindings: Vec<BindingNode>,
    references: Vec<Vec<CppName>>,
    syntax_errors: usize,
}

impl CppUnit {
    /// Parse `text` (the contents of `path`) and resolve its names.
    pub fn parse(path: &Path, text: &str, options: &CppOptions) -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar(options.language))
            .map_err(|e| {
                XrefError::parse(
                    path,
                    format!("Failed to set {} language: {:?}", options.language.as_str(), e),
                )
            })?;

        let tree = parser
            .parse(text, None)
            .ok_or_else(|| XrefError::parse(path, "Parse failed - no tree returned"))?;
        let root = tree.root_node();

        let syntax_errors = log_syntax_errors(path, root);
        if syntax_errors > 0 && !options.error_recovery {
            return Err(XrefError::parse(
                path,
                format!("{} syntax error(s) and error recovery is disabled", syntax_errors),
            ));
        }

        let mut builder = Builder::new(text, options.language);
        builder.walk(root);
        builder.resolve();
        let mut unit = builder.finish(options.declarations_as_references);
        unit.syntax_errors = syntax_errors;

        log::debug!(
            "{}: {} declarations, {} names, {} bindings",
            path.display(),
            unit.decls.len(),
            unit.names.len(),
            unit.bindings.len()
        );
        Ok(unit)
    }

    /// Grammar the unit was parsed with.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Number of ERROR and MISSING nodes in the parse tree.
    pub fn syntax_errors(&self) -> usize {
        self.syntax_errors
    }

    /// Spelling of `name`.
    pub fn name_text(&self, name: CppName) -> &str {
        &self.names[name.0].text
    }

    /// Tree-sitter node kind of `decl`, e.g. `function_definition`.
    pub fn declaration_kind(&self, decl: CppDecl) -> &'static str {
        self.decls[decl.0].kind
    }

    /// Spelling of the symbol `binding` identifies.
    pub fn binding_name(&self, binding: CppBinding) -> &str {
        &self.bindings[binding.0].name
    }

    /// Kind of the symbol, taken from its first declaration.
    pub fn binding_kind(&self, binding: CppBinding) -> CppSymbolKind {
        self.bindings[binding.0].kind
    }

    /// Names spelled `text`, in source order.
    pub fn names_spelled<'a>(&'a self, text: &'a str) -> impl Iterator<Item = CppName> + 'a {
        self.names
            .iter()
            .enumerate()
            .filter(move |(_, name)| name.text == text)
            .map(|(index, _)| CppName(index))
    }
}

impl TranslationUnit for CppUnit {
    type Declaration = CppDecl;
    type Name = CppName;
    type Binding = CppBinding;

    fn declarations(&self) -> &[CppDecl] {
        &self.top_level
    }

    fn nested_declarations(&self, decl: CppDecl) -> &[CppDecl] {
        &self.decls[decl.0].nested
    }

    fn names(&self, decl: CppDecl) -> &[CppName] {
        &self.decls[decl.0].names
    }

    fn is_active(&self, decl: CppDecl) -> bool {
        self.decls[decl.0].active
    }

    // includes are not expanded, so everything comes from the file itself
    fn is_declaration_in_file(&self, _decl: CppDecl) -> bool {
        true
    }

    fn is_declaration(&self, name: CppName) -> bool {
        self.names[name.0].declaration
    }

    fn is_name_in_file(&self, _name: CppName) -> bool {
        true
    }

    fn file_location(&self, name: CppName) -> Option<FileLocation> {
        self.names[name.0].location
    }

    fn resolve_binding(&self, name: CppName) -> Option<CppBinding> {
        self.names[name.0].binding
    }

    fn references(&self, binding: CppBinding) -> &[CppName] {
        &self.references[binding.0]
    }
}

fn grammar(language: Language) -> tree_sitter::Language {
    match language {
        Language::C => tree_sitter_c::language(),
        Language::Cpp => tree_sitter_cpp::language(),
    }
}

/// Log every ERROR and MISSING node at debug level and count them.
fn log_syntax_errors(path: &Path, root: Node) -> usize {
    if !root.has_error() {
        return 0;
    }

    let mut count = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            count += 1;
            let at = node.start_position();
            let what = if node.is_missing() { "missing" } else { "syntax error" };
            log::debug!(
                "{}:{}:{}: {} ({})",
                path.display(),
                at.row + 1,
                at.column,
                what,
                node.kind()
            );
        }
        if node.has_error() {
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor));
        }
    }
    count
}

/// Tree-sitter node id, used to link names and types across passes.
type NodeId = usize;

/// Declared type of a symbol, resolved once all uses are bound.
#[derive(Debug, Clone, Copy)]
enum TypeRef {
    /// A type name use, e.g. `Point` in `Point p;`.
    Name(NodeId),
    /// An inline class/struct/union/enum body.
    Specifier(NodeId),
}

/// The object of a member access.
#[derive(Debug, Clone, Copy)]
enum ObjectRef {
    Name(NodeId),
    Class(ScopeId),
}

/// What a resolved use does to the scopes besides being bound.
#[derive(Debug, Clone, Copy)]
enum Effect {
    None,
    UsingNamespace(ScopeId),
    UsingDeclaration { into: ScopeId, position: usize },
    Base(ScopeId),
}

/// A use (possibly qualified) to resolve after the walk.
#[derive(Debug)]
struct PendingUse {
    names: Vec<CppName>,
    /// Name space of the last segment; earlier ones are qualifiers.
    space: NameSpace,
    global: bool,
    scope: ScopeId,
    position: usize,
    effect: Effect,
}

#[derive(Debug)]
struct PendingField {
    name: CppName,
    object: Option<ObjectRef>,
}

#[derive(Debug)]
struct MacroSpan {
    from: usize,
    until: Option<usize>,
}

#[derive(Debug)]
struct MacroEntry {
    binding: CppBinding,
    spans: Vec<MacroSpan>,
}

#[derive(Debug, Clone, Copy)]
struct Ctx {
    /// Scope used for lookups.
    scope: ScopeId,
    /// Scope receiving declarations (differs from `scope` under templates).
    declare_in: ScopeId,
    /// Declaration owning the names and declarations found below.
    owner: Option<CppDecl>,
    active: bool,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Walk,
    /// Children of a function body, which shares the function's scope.
    Body,
    /// Inside a declarator: the name found is declared.
    Declarator {
        kind: CppSymbolKind,
        type_ref: Option<TypeRef>,
        params: Option<ScopeId>,
    },
    /// The member name of a field expression.
    Field(Option<ObjectRef>),
    /// An `#elif`/`#else` alternative; `taken` once an earlier branch was.
    Branch { taken: bool },
}

type Frame<'t> = (Node<'t>, Ctx, Mode);

/// A possibly qualified name split into its segments.
#[derive(Default)]
struct Chain<'t> {
    global: bool,
    /// A segment that is not a plain name (decltype, dependent type).
    broken: bool,
    segments: Vec<Node<'t>>,
    /// Template arguments and other subtrees walked as ordinary uses.
    extras: Vec<Node<'t>>,
}

impl<'t> Chain<'t> {
    fn of(node: Node<'t>) -> Self {
        let mut chain = Chain::default();
        let mut current = node;
        let mut outermost = true;
        while is_qualified(current.kind()) {
            match current.child_by_field_name("scope") {
                Some(scope) => chain.push_segment(scope),
                None if outermost => chain.global = true,
                None => {}
            }
            outermost = false;
            match current.child_by_field_name("name") {
                Some(name) => current = name,
                None => {
                    chain.broken = true;
                    return chain;
                }
            }
        }
        chain.push_segment(current);
        chain
    }

    fn push_segment(&mut self, node: Node<'t>) {
        match node.kind() {
            "template_type" | "template_function" | "template_method" => {
                match node.child_by_field_name("name") {
                    Some(name) => self.segments.push(name),
                    None => self.broken = true,
                }
                if let Some(arguments) = node.child_by_field_name("arguments") {
                    self.extras.push(arguments);
                }
            }
            kind if is_name_leaf(kind) => self.segments.push(node),
            _ => {
                self.broken = true;
                self.extras.push(node);
            }
        }
    }
}

/// Tags live apart from ordinary names, as in `struct stat` and `stat()`.
fn name_space(kind: CppSymbolKind) -> NameSpace {
    match kind {
        CppSymbolKind::Class | CppSymbolKind::Struct | CppSymbolKind::Union | CppSymbolKind::Enum => {
            NameSpace::Tag
        }
        _ => NameSpace::Ordinary,
    }
}

fn is_name_leaf(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "type_identifier"
            | "namespace_identifier"
            | "field_identifier"
            | "destructor_name"
            | "operator_name"
    )
}

fn is_qualified(kind: &str) -> bool {
    matches!(
        kind,
        "qualified_identifier" | "qualified_type_identifier" | "qualified_field_identifier"
    )
}

fn is_declarator_like(kind: &str) -> bool {
    kind.ends_with("declarator") || is_name_leaf(kind) || is_qualified(kind) || kind == "template_function"
}

/// Named children with their field names, in source order.
fn fields<'t>(node: Node<'t>) -> Vec<(Option<&'static str>, Node<'t>)> {
    let mut cursor = node.walk();
    let mut fields = Vec::new();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() {
                fields.push((cursor.field_name(), child));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    fields
}

fn push_children<'t>(node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
    let mut cursor = node.walk();
    out.extend(node.named_children(&mut cursor).map(|child| (child, ctx, Mode::Walk)));
}

fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

/// The declarator one level down, e.g. `p` in `*p`.
fn inner_declarator(node: Node<'_>) -> Option<Node<'_>> {
    if let Some(declarator) = node.child_by_field_name("declarator") {
        return Some(declarator);
    }
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| is_declarator_like(child.kind()));
    found
}

/// The name a declarator ultimately declares.
fn declarator_name(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    loop {
        let kind = current.kind();
        if is_name_leaf(kind) || is_qualified(kind) || kind == "template_function" {
            return Some(current);
        }
        current = inner_declarator(current)?;
    }
}

fn type_ref_of(node: Node) -> Option<TypeRef> {
    match node.kind() {
        "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier" => {
            if node.child_by_field_name("body").is_some() {
                Some(TypeRef::Specifier(node.id()))
            } else {
                node.child_by_field_name("name").and_then(type_ref_of)
            }
        }
        "type_descriptor" => node.child_by_field_name("type").and_then(type_ref_of),
        "template_type" => node
            .child_by_field_name("name")
            .map(|name| TypeRef::Name(name.id())),
        "type_identifier" => Some(TypeRef::Name(node.id())),
        kind if is_qualified(kind) => {
            let chain = Chain::of(node);
            if chain.broken {
                None
            } else {
                chain.segments.last().map(|name| TypeRef::Name(name.id()))
            }
        }
        _ => None,
    }
}

/// Whether a body-less class or enum specifier declares the tag rather
/// than naming it in some other declaration.
fn is_forward_declaration(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "translation_unit" | "declaration_list" | "field_declaration_list" | "template_declaration"
        | "linkage_specification" | "compound_statement" | "preproc_if" | "preproc_ifdef"
        | "preproc_elif" | "preproc_elifdef" | "preproc_else" => true,
        "declaration" | "field_declaration" => parent.child_by_field_name("declarator").is_none(),
        _ => false,
    }
}

/// `a::b::c` segments of a nested namespace definition name.
fn namespace_segments(node: Node<'_>) -> Vec<Node<'_>> {
    let mut segments = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == "namespace_identifier" || current.kind() == "identifier" {
            segments.push(current);
            continue;
        }
        let mut cursor = current.walk();
        let children: Vec<Node> = current.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    segments
}

struct Builder<'s> {
    source: &'s [u8],
    rope: Rope,
    unit: CppUnit,
    scopes: Scopes,
    macros: HashMap<String, MacroEntry>,
    macro_values: MacroValues,
    uses: Vec<PendingUse>,
    fields: Vec<PendingField>,
    name_by_node: HashMap<NodeId, CppName>,
    specifier_scopes: HashMap<NodeId, ScopeId>,
}

impl<'s> Builder<'s> {
    fn new(text: &'s str, language: Language) -> Self {
        Self {
            source: text.as_bytes(),
            rope: Rope::from_str(text),
            unit: CppUnit {
                language,
                top_level: Vec::new(),
                decls: Vec::new(),
                names: Vec::new(),
                bindings: Vec::new(),
                references: Vec::new(),
                syntax_errors: 0,
            },
            scopes: Scopes::new(language == Language::Cpp),
            macros: HashMap::new(),
            macro_values: MacroValues::new(),
            uses: Vec::new(),
            fields: Vec::new(),
            name_by_node: HashMap::new(),
            specifier_scopes: HashMap::new(),
        }
    }

    /// First pass: preorder walk with an explicit stack.
    fn walk(&mut self, root: Node<'_>) {
        let file = Ctx {
            scope: Scopes::FILE,
            declare_in: Scopes::FILE,
            owner: None,
            active: true,
        };
        let mut stack = vec![(root, file, Mode::Walk)];
        let mut children = Vec::new();
        while let Some((node, ctx, mode)) = stack.pop() {
            self.visit(node, ctx, mode, &mut children);
            // reversed so the first child is popped first
            stack.extend(children.drain(..).rev());
        }
    }

    fn visit<'t>(&mut self, node: Node<'t>, ctx: Ctx, mode: Mode, out: &mut Vec<Frame<'t>>) {
        match mode {
            Mode::Walk => self.visit_node(node, ctx, out),
            Mode::Body => push_children(node, ctx, out),
            Mode::Declarator {
                kind,
                type_ref,
                params,
            } => self.visit_declarator(node, ctx, kind, type_ref, params, out),
            Mode::Field(object) if node.kind() == "field_identifier" => {
                let name = self.add_name(node, ctx, false);
                self.fields.push(PendingField { name, object });
            }
            Mode::Field(_) => self.visit_node(node, ctx, out),
            Mode::Branch { taken } => self.visit_conditional(node, ctx, taken, out),
        }
    }

    fn visit_node<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        match node.kind() {
            "comment" | "string_literal" | "raw_string_literal" | "char_literal" | "number_literal"
            | "primitive_type" | "preproc_include" | "preproc_arg" | "statement_identifier"
            | "field_designator" | "this" | "true" | "false" | "null" | "nullptr" => {}
            "function_definition" => self.visit_function(node, ctx, out),
            "declaration" => self.visit_declaration(node, ctx, CppSymbolKind::Variable, out),
            "field_declaration" => self.visit_declaration(node, ctx, CppSymbolKind::Field, out),
            "parameter_declaration"
            | "optional_parameter_declaration"
            | "variadic_parameter_declaration" => {
                self.visit_declaration(node, ctx, CppSymbolKind::Parameter, out)
            }
            "type_definition" => self.visit_declaration(node, ctx, CppSymbolKind::TypeAlias, out),
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                self.visit_class(node, ctx, out)
            }
            "enum_specifier" => self.visit_enum(node, ctx, out),
            "enumerator" => self.visit_enumerator(node, ctx, out),
            "namespace_definition" => self.visit_namespace(node, ctx, out),
            "template_declaration" => self.visit_template(node, ctx, out),
            "type_parameter_declaration"
            | "optional_type_parameter_declaration"
            | "variadic_type_parameter_declaration" => self.visit_type_parameter(node, ctx, out),
            "alias_declaration" => self.visit_alias(node, ctx, out),
            "using_declaration" => self.visit_using(node, ctx, out),
            "preproc_def" | "preproc_function_def" => self.visit_macro_definition(node, ctx),
            "preproc_call" => self.visit_preproc_call(node, ctx),
            "preproc_if" | "preproc_ifdef" => self.visit_conditional(node, ctx, false, out),
            "compound_statement" | "for_statement" | "for_range_loop" | "if_statement"
            | "while_statement" | "switch_statement" | "catch_clause" => {
                self.visit_block(node, ctx, out)
            }
            "lambda_expression" => self.visit_lambda(node, ctx, out),
            "field_expression" => self.visit_field_expression(node, ctx, out),
            kind if is_name_leaf(kind) || is_qualified(kind) => {
                self.visit_use(node, ctx, NameSpace::Ordinary, Effect::None, out)
            }
            _ => push_children(node, ctx, out),
        }
    }

    fn open_decl(&mut self, node: Node, ctx: Ctx) -> (CppDecl, Ctx) {
        let id = CppDecl(self.unit.decls.len());
        self.unit.decls.push(DeclNode {
            kind: node.kind(),
            nested: Vec::new(),
            names: Vec::new(),
            active: ctx.active,
        });
        match ctx.owner {
            Some(parent) => self.unit.decls[parent.0].nested.push(id),
            None => self.unit.top_level.push(id),
        }
        (id, Ctx { owner: Some(id), ..ctx })
    }

    fn add_name(&mut self, node: Node, ctx: Ctx, declaration: bool) -> CppName {
        let id = CppName(self.unit.names.len());
        let text = node.utf8_text(self.source).unwrap_or_default().to_string();
        // zero-width nodes come from error recovery and have no location
        let location = (!node.is_missing() && node.end_byte() > node.start_byte()).then(|| {
            let start = self.rope.byte_to_char(node.start_byte());
            let end = self.rope.byte_to_char(node.end_byte());
            FileLocation::new(start, end - start)
        });
        self.unit.names.push(NameNode {
            text,
            location,
            declaration,
            binding: None,
        });
        if let Some(owner) = ctx.owner {
            self.unit.decls[owner.0].names.push(id);
        }
        self.name_by_node.insert(node.id(), id);
        id
    }

    fn new_binding(&mut self, name: &str, kind: CppSymbolKind) -> CppBinding {
        self.unit.bindings.push(BindingNode {
            name: name.to_string(),
            kind,
            member_scope: None,
            type_ref: None,
            type_scope: None,
        });
        CppBinding(self.unit.bindings.len() - 1)
    }

    fn bind_declaration(&mut self, name: CppName, binding: CppBinding, type_ref: Option<TypeRef>) {
        self.unit.names[name.0].binding = Some(binding);
        let data = &mut self.unit.bindings[binding.0];
        if data.type_ref.is_none() {
            data.type_ref = type_ref;
        }
    }

    /// Declare the name at `node` in `scope`, merging with an earlier
    /// declaration of the same spelling there.
    fn declare(
        &mut self,
        node: Node,
        ctx: Ctx,
        scope: ScopeId,
        kind: CppSymbolKind,
        type_ref: Option<TypeRef>,
    ) -> Option<CppBinding> {
        let name = self.add_name(node, ctx, true);
        let text = self.unit.names[name.0].text.clone();
        if text.is_empty() {
            return None;
        }
        let space = name_space(kind);
        let binding = match self.scopes.local(scope, space, &text) {
            Some(existing) => existing,
            None => {
                let binding = self.new_binding(&text, kind);
                self.scopes.declare(scope, space, &text, binding, node.start_byte());
                binding
            }
        };
        self.bind_declaration(name, binding, type_ref);
        Some(binding)
    }

    /// Declare `Owner::name`: the prefix is resolved right away and the
    /// member it names (or a new one) is bound.
    fn declare_qualified<'t>(
        &mut self,
        node: Node<'t>,
        ctx: Ctx,
        kind: CppSymbolKind,
        type_ref: Option<TypeRef>,
        out: &mut Vec<Frame<'t>>,
    ) -> Option<CppBinding> {
        let chain = Chain::of(node);
        out.extend(chain.extras.iter().map(|&extra| (extra, ctx, Mode::Walk)));
        let (&last, prefix) = chain.segments.split_last()?;

        let mut scope = chain.global.then_some(Scopes::FILE);
        let mut resolvable = !chain.broken;
        for (index, &segment) in prefix.iter().enumerate() {
            let name = self.add_name(segment, ctx, false);
            let text = self.unit.names[name.0].text.as_str();
            let binding = match scope {
                Some(scope) => self.scopes.lookup_member(scope, NameSpace::Qualifier, text),
                None if index == 0 && resolvable => {
                    self.scopes
                        .lookup(ctx.scope, NameSpace::Qualifier, text, segment.start_byte())
                }
                None => None,
            };
            self.unit.names[name.0].binding = binding;
            scope = binding.and_then(|b| self.unit.bindings[b.0].member_scope);
            resolvable &= scope.is_some();
        }

        let name = self.add_name(last, ctx, true);
        let text = self.unit.names[name.0].text.clone();
        let owner = scope.filter(|_| resolvable && !text.is_empty())?;
        let space = name_space(kind);
        let binding = match self.scopes.lookup_member(owner, space, &text) {
            Some(existing) => existing,
            None => {
                let binding = self.new_binding(&text, kind);
                self.scopes.declare(owner, space, &text, binding, last.start_byte());
                binding
            }
        };
        self.bind_declaration(name, binding, type_ref);
        Some(binding)
    }

    /// Member scope named by the prefix of a qualified declarator, without
    /// recording any names.
    fn owner_scope(&self, declarator: Node, ctx: Ctx) -> Option<ScopeId> {
        let name = declarator_name(declarator)?;
        if !is_qualified(name.kind()) {
            return None;
        }
        let chain = Chain::of(name);
        if chain.broken {
            return None;
        }
        let (_, prefix) = chain.segments.split_last()?;
        let mut scope = chain.global.then_some(Scopes::FILE);
        for segment in prefix {
            let text = segment.utf8_text(self.source).ok()?;
            let binding = match scope {
                Some(scope) => self.scopes.lookup_member(scope, NameSpace::Qualifier, text)?,
                None => self
                    .scopes
                    .lookup(ctx.scope, NameSpace::Qualifier, text, segment.start_byte())?,
            };
            scope = Some(self.unit.bindings[binding.0].member_scope?);
        }
        scope
    }

    fn visit_use<'t>(
        &mut self,
        node: Node<'t>,
        ctx: Ctx,
        space: NameSpace,
        effect: Effect,
        out: &mut Vec<Frame<'t>>,
    ) {
        let chain = Chain::of(node);
        let names: Vec<CppName> = chain
            .segments
            .iter()
            .map(|&segment| self.add_name(segment, ctx, false))
            .collect();
        if !chain.broken && !names.is_empty() {
            self.uses.push(PendingUse {
                names,
                space,
                global: chain.global,
                scope: ctx.scope,
                position: node.start_byte(),
                effect,
            });
        }
        out.extend(chain.extras.iter().map(|&extra| (extra, ctx, Mode::Walk)));
    }

    fn visit_declarator<'t>(
        &mut self,
        node: Node<'t>,
        ctx: Ctx,
        kind: CppSymbolKind,
        type_ref: Option<TypeRef>,
        params: Option<ScopeId>,
        out: &mut Vec<Frame<'t>>,
    ) {
        let node_kind = node.kind();
        if is_name_leaf(node_kind) {
            self.declare(node, ctx, ctx.declare_in, kind, type_ref);
            return;
        }
        if is_qualified(node_kind) {
            self.declare_qualified(node, ctx, kind, type_ref, out);
            return;
        }

        match node_kind {
            "function_declarator"
            | "function_field_declarator"
            | "function_type_declarator"
            | "abstract_function_declarator" => {
                let kind = match kind {
                    CppSymbolKind::Variable | CppSymbolKind::Field => CppSymbolKind::Function,
                    other => other,
                };
                let scope = params
                    .unwrap_or_else(|| self.scopes.push(ScopeKind::Function, Some(ctx.scope)));
                for (field, child) in fields(node) {
                    match field {
                        Some("declarator") => out.push((
                            child,
                            ctx,
                            Mode::Declarator {
                                kind,
                                type_ref,
                                params: None,
                            },
                        )),
                        Some("parameters") => out.push((
                            child,
                            Ctx {
                                scope,
                                declare_in: scope,
                                ..ctx
                            },
                            Mode::Walk,
                        )),
                        _ => out.push((child, Ctx { scope, ..ctx }, Mode::Walk)),
                    }
                }
            }
            "init_declarator" => {
                for (field, child) in fields(node) {
                    let mode = if field == Some("declarator") {
                        Mode::Declarator {
                            kind,
                            type_ref,
                            params,
                        }
                    } else {
                        Mode::Walk
                    };
                    out.push((child, ctx, mode));
                }
            }
            "template_function" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare(name, ctx, ctx.declare_in, kind, type_ref);
                }
                if let Some(arguments) = node.child_by_field_name("arguments") {
                    out.push((arguments, ctx, Mode::Walk));
                }
            }
            "structured_binding_declarator" => {
                for (_, child) in fields(node) {
                    if child.kind() == "identifier" {
                        self.declare(child, ctx, ctx.declare_in, CppSymbolKind::Variable, None);
                    }
                }
            }
            wrapper if wrapper.ends_with("declarator") => {
                let inner = inner_declarator(node);
                for (_, child) in fields(node) {
                    let mode = if Some(child) == inner {
                        Mode::Declarator {
                            kind,
                            type_ref,
                            params,
                        }
                    } else {
                        Mode::Walk
                    };
                    out.push((child, ctx, mode));
                }
            }
            _ => out.push((node, ctx, Mode::Walk)),
        }
    }

    fn visit_function<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let (_, inner) = self.open_decl(node, ctx);
        // an out-of-line member body sees the members of its class
        let owner = node
            .child_by_field_name("declarator")
            .and_then(|declarator| self.owner_scope(declarator, ctx));
        let scope = self
            .scopes
            .push(ScopeKind::Function, Some(owner.unwrap_or(ctx.scope)));
        let body = Ctx {
            scope,
            declare_in: scope,
            ..inner
        };

        for (field, child) in fields(node) {
            match field {
                Some("declarator") => out.push((
                    child,
                    inner,
                    Mode::Declarator {
                        kind: CppSymbolKind::Function,
                        type_ref: None,
                        params: Some(scope),
                    },
                )),
                Some("body") => out.push((child, body, Mode::Body)),
                _ if child.kind() == "field_initializer_list" => out.push((child, body, Mode::Walk)),
                _ => out.push((child, inner, Mode::Walk)),
            }
        }
    }

    fn visit_declaration<'t>(
        &mut self,
        node: Node<'t>,
        ctx: Ctx,
        kind: CppSymbolKind,
        out: &mut Vec<Frame<'t>>,
    ) {
        let (_, inner) = self.open_decl(node, ctx);
        let type_ref = node.child_by_field_name("type").and_then(type_ref_of);
        for (field, child) in fields(node) {
            let mode = if field == Some("declarator") {
                Mode::Declarator {
                    kind,
                    type_ref,
                    params: None,
                }
            } else {
                Mode::Walk
            };
            out.push((child, inner, mode));
        }
    }

    fn visit_class<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let body = node.child_by_field_name("body");
        if body.is_none() && !is_forward_declaration(node) {
            // elaborated type specifier: `struct S s;` only names the tag
            self.visit_elaborated(node, ctx, out);
            return;
        }

        let (_, inner) = self.open_decl(node, ctx);
        let kind = match node.kind() {
            "struct_specifier" => CppSymbolKind::Struct,
            "union_specifier" => CppSymbolKind::Union,
            _ => CppSymbolKind::Class,
        };
        let binding = match node.child_by_field_name("name") {
            Some(name) if is_qualified(name.kind()) => {
                self.declare_qualified(name, inner, kind, None, out)
            }
            Some(name) if name.kind() == "template_type" => {
                // a specialization shares the primary template's binding
                if let Some(arguments) = name.child_by_field_name("arguments") {
                    out.push((arguments, inner, Mode::Walk));
                }
                name.child_by_field_name("name")
                    .and_then(|n| self.declare(n, inner, ctx.declare_in, kind, None))
            }
            Some(name) => self.declare(name, inner, ctx.declare_in, kind, None),
            None => None,
        };

        if body.is_none() {
            return;
        }
        let scope = self.member_scope(binding, ScopeKind::Class, ctx.scope);
        self.specifier_scopes.insert(node.id(), scope);
        let members = Ctx {
            scope,
            declare_in: scope,
            ..inner
        };

        for (field, child) in fields(node) {
            match field {
                Some("name") => {}
                Some("body") => out.push((child, members, Mode::Walk)),
                _ if child.kind() == "base_class_clause" => {
                    for (_, base) in fields(child) {
                        let base_kind = base.kind();
                        if base_kind == "type_identifier"
                            || base_kind == "template_type"
                            || is_qualified(base_kind)
                        {
                            self.visit_use(base, inner, NameSpace::Qualifier, Effect::Base(scope), out);
                        } else {
                            out.push((base, inner, Mode::Walk));
                        }
                    }
                }
                _ => out.push((child, inner, Mode::Walk)),
            }
        }
    }

    /// `struct S`, `union U`, `enum E` naming a tag without declaring it.
    fn visit_elaborated<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        for (field, child) in fields(node) {
            let kind = child.kind();
            if field == Some("name") && (is_name_leaf(kind) || is_qualified(kind)) {
                self.visit_use(child, ctx, NameSpace::Tag, Effect::None, out);
            } else {
                out.push((child, ctx, Mode::Walk));
            }
        }
    }

    /// The member scope of `binding`, created under `parent` on first use.
    fn member_scope(&mut self, binding: Option<CppBinding>, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        if let Some(scope) = binding.and_then(|b| self.unit.bindings[b.0].member_scope) {
            return scope;
        }
        let scope = self.scopes.push(kind, Some(parent));
        if let Some(b) = binding {
            self.unit.bindings[b.0].member_scope = Some(scope);
        }
        scope
    }

    fn visit_enum<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let body = node.child_by_field_name("body");
        if body.is_none() && !is_forward_declaration(node) {
            self.visit_elaborated(node, ctx, out);
            return;
        }

        let (_, inner) = self.open_decl(node, ctx);
        let binding = match node.child_by_field_name("name") {
            Some(name) if is_qualified(name.kind()) => {
                self.declare_qualified(name, inner, CppSymbolKind::Enum, None, out)
            }
            Some(name) => self.declare(name, inner, ctx.declare_in, CppSymbolKind::Enum, None),
            None => None,
        };

        let enumerators = body.map(|_| {
            let scope = self.member_scope(binding, ScopeKind::Namespace, ctx.scope);
            self.specifier_scopes.insert(node.id(), scope);
            let scoped = has_token(node, "class") || has_token(node, "struct");
            Ctx {
                scope,
                declare_in: if scoped { scope } else { ctx.declare_in },
                ..inner
            }
        });

        for (field, child) in fields(node) {
            match (field, enumerators) {
                (Some("name"), _) => {}
                (Some("body"), Some(enumerators)) => out.push((child, enumerators, Mode::Walk)),
                _ => out.push((child, inner, Mode::Walk)),
            }
        }
    }

    fn visit_enumerator<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let (_, inner) = self.open_decl(node, ctx);
        for (field, child) in fields(node) {
            if field != Some("name") {
                out.push((child, inner, Mode::Walk));
                continue;
            }
            let binding = self.declare(child, inner, ctx.declare_in, CppSymbolKind::Enumerator, None);
            // unscoped enumerators are also reachable as `Enum::name`
            if let (Some(binding), true) = (binding, ctx.scope != ctx.declare_in) {
                let text = self.unit.bindings[binding.0].name.clone();
                self.scopes
                    .declare(ctx.scope, NameSpace::Ordinary, &text, binding, child.start_byte());
            }
        }
    }

    fn visit_namespace<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let (_, inner) = self.open_decl(node, ctx);
        let mut scope = ctx.declare_in;
        // an anonymous namespace adds its members to the enclosing scope
        if let Some(name) = node.child_by_field_name("name") {
            for segment in namespace_segments(name) {
                let binding = self.declare(segment, inner, scope, CppSymbolKind::Namespace, None);
                scope = self.member_scope(binding, ScopeKind::Namespace, scope);
            }
        }

        let members = Ctx {
            scope,
            declare_in: scope,
            ..inner
        };
        for (field, child) in fields(node) {
            match field {
                Some("name") => {}
                Some("body") => out.push((child, members, Mode::Walk)),
                _ => out.push((child, inner, Mode::Walk)),
            }
        }
    }

    fn visit_template<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let (_, inner) = self.open_decl(node, ctx);
        let scope = self.scopes.push(ScopeKind::Template, Some(ctx.scope));
        for (field, child) in fields(node) {
            let child_ctx = if field == Some("parameters") {
                Ctx {
                    scope,
                    declare_in: scope,
                    ..inner
                }
            } else {
                // the templated entity itself lands in the enclosing scope
                Ctx { scope, ..inner }
            };
            out.push((child, child_ctx, Mode::Walk));
        }
    }

    fn visit_type_parameter<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let (_, inner) = self.open_decl(node, ctx);
        for (field, child) in fields(node) {
            let is_default = matches!(field, Some("default_type") | Some("default_value"));
            if !is_default && child.kind() == "type_identifier" {
                self.declare(child, inner, ctx.declare_in, CppSymbolKind::TemplateParameter, None);
            } else {
                out.push((child, inner, Mode::Walk));
            }
        }
    }

    fn visit_alias<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let (_, inner) = self.open_decl(node, ctx);
        let type_ref = node.child_by_field_name("type").and_then(type_ref_of);
        for (field, child) in fields(node) {
            if field == Some("name") {
                self.declare(child, inner, ctx.declare_in, CppSymbolKind::TypeAlias, type_ref);
            } else {
                out.push((child, inner, Mode::Walk));
            }
        }
    }

    fn visit_using<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let (_, inner) = self.open_decl(node, ctx);
        let effect = if has_token(node, "namespace") {
            Effect::UsingNamespace(ctx.declare_in)
        } else {
            Effect::UsingDeclaration {
                into: ctx.declare_in,
                position: node.end_byte(),
            }
        };
        for (_, child) in fields(node) {
            let kind = child.kind();
            if is_name_leaf(kind) || is_qualified(kind) {
                self.visit_use(child, inner, NameSpace::Ordinary, effect, out);
            } else {
                out.push((child, inner, Mode::Walk));
            }
        }
    }

    fn visit_macro_definition(&mut self, node: Node, ctx: Ctx) {
        let (_, inner) = self.open_decl(node, ctx);
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.add_name(name_node, inner, true);
        let text = self.unit.names[name.0].text.clone();
        if text.is_empty() {
            return;
        }

        let binding = match self.macros.get(&text) {
            Some(entry) => entry.binding,
            None => self.new_binding(&text, CppSymbolKind::Macro),
        };
        self.macros
            .entry(text.clone())
            .or_insert_with(|| MacroEntry {
                binding,
                spans: Vec::new(),
            })
            .spans
            .push(MacroSpan {
                from: node.end_byte(),
                until: None,
            });
        self.unit.names[name.0].binding = Some(binding);

        if ctx.active {
            let value = match node.kind() {
                "preproc_def" => match node.child_by_field_name("value") {
                    Some(body) => preproc::macro_value(body.utf8_text(self.source).unwrap_or_default()),
                    None => Some(1),
                },
                _ => None,
            };
            self.macro_values.insert(text, value);
        }
    }

    fn visit_preproc_call(&mut self, node: Node, ctx: Ctx) {
        let source = self.source;
        let directive = node
            .child_by_field_name("directive")
            .and_then(|d| d.utf8_text(source).ok())
            .map(str::trim);
        if directive != Some("#undef") {
            return;
        }
        let Some(name) = node
            .child_by_field_name("argument")
            .and_then(|a| a.utf8_text(source).ok())
            .map(str::trim)
        else {
            return;
        };

        if let Some(span) = self
            .macros
            .get_mut(name)
            .and_then(|entry| entry.spans.last_mut())
        {
            if span.until.is_none() {
                span.until = Some(node.start_byte());
            }
        }
        if ctx.active {
            self.macro_values.remove(name);
        }
    }

    /// `#if`/`#ifdef` and their alternatives. `taken` is set once an earlier
    /// branch of the same conditional was active or undecidable.
    fn visit_conditional<'t>(&mut self, node: Node<'t>, ctx: Ctx, taken: bool, out: &mut Vec<Frame<'t>>) {
        let source = self.source;
        let condition = match node.kind() {
            "preproc_if" | "preproc_elif" => node
                .child_by_field_name("condition")
                .and_then(|c| preproc::evaluate(c, source, &self.macro_values))
                .map(|value| value != 0),
            "preproc_ifdef" | "preproc_elifdef" => {
                let negated = node.child(0).map_or(false, |token| token.kind().ends_with("ndef"));
                node.child_by_field_name("name")
                    .and_then(|name| name.utf8_text(source).ok())
                    .map(|name| self.macro_values.contains_key(name) != negated)
            }
            _ => Some(true),
        };

        let branch = Ctx {
            active: ctx.active && !taken && condition != Some(false),
            ..ctx
        };
        // an undecidable condition keeps its own branch and closes the rest
        let taken = taken || condition.unwrap_or(true);

        for (field, child) in fields(node) {
            match field {
                Some("condition") | Some("name") => out.push((child, ctx, Mode::Walk)),
                Some("alternative") => out.push((child, ctx, Mode::Branch { taken })),
                _ => out.push((child, branch, Mode::Walk)),
            }
        }
    }

    fn visit_block<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let scope = self.scopes.push(ScopeKind::Block, Some(ctx.scope));
        let inner = Ctx {
            scope,
            declare_in: scope,
            ..ctx
        };
        if node.kind() != "for_range_loop" {
            push_children(node, inner, out);
            return;
        }

        let type_ref = node.child_by_field_name("type").and_then(type_ref_of);
        for (field, child) in fields(node) {
            let mode = if field == Some("declarator") {
                Mode::Declarator {
                    kind: CppSymbolKind::Variable,
                    type_ref,
                    params: None,
                }
            } else {
                Mode::Walk
            };
            out.push((child, inner, mode));
        }
    }

    fn visit_lambda<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let scope = self.scopes.push(ScopeKind::Function, Some(ctx.scope));
        let inner = Ctx {
            scope,
            declare_in: scope,
            ..ctx
        };
        for (field, child) in fields(node) {
            match field {
                Some("declarator") => out.push((child, inner, Mode::Walk)),
                Some("body") => out.push((child, inner, Mode::Body)),
                _ => out.push((child, ctx, Mode::Walk)),
            }
        }
    }

    fn visit_field_expression<'t>(&mut self, node: Node<'t>, ctx: Ctx, out: &mut Vec<Frame<'t>>) {
        let object = node
            .child_by_field_name("argument")
            .and_then(|argument| self.object_of(argument, ctx));
        for (field, child) in fields(node) {
            let mode = if field == Some("field") {
                Mode::Field(object)
            } else {
                Mode::Walk
            };
            out.push((child, ctx, mode));
        }
    }

    fn object_of(&self, node: Node, ctx: Ctx) -> Option<ObjectRef> {
        let mut current = node;
        loop {
            match current.kind() {
                "identifier" => return Some(ObjectRef::Name(current.id())),
                "field_expression" => {
                    return current
                        .child_by_field_name("field")
                        .map(|field| ObjectRef::Name(field.id()))
                }
                "this" => return self.scopes.enclosing_class(ctx.scope).map(ObjectRef::Class),
                "parenthesized_expression" => current = current.named_child(0)?,
                "pointer_expression" | "subscript_expression" => {
                    current = current.child_by_field_name("argument")?
                }
                kind if is_qualified(kind) => {
                    let chain = Chain::of(current);
                    return chain.segments.last().map(|name| ObjectRef::Name(name.id()));
                }
                _ => return None,
            }
        }
    }

    fn macro_at(&self, name: &str, position: usize) -> Option<CppBinding> {
        let entry = self.macros.get(name)?;
        entry
            .spans
            .iter()
            .any(|span| span.from <= position && span.until.map_or(true, |until| position < until))
            .then_some(entry.binding)
    }

    fn scope_of(&self, binding: CppBinding) -> Option<ScopeId> {
        let data = &self.unit.bindings[binding.0];
        data.member_scope.or(data.type_scope)
    }

    /// Second pass. Using directives and base classes go first since they
    /// change what later lookups see.
    fn resolve(&mut self) {
        let uses = std::mem::take(&mut self.uses);
        let (early, late): (Vec<_>, Vec<_>) = uses
            .into_iter()
            .partition(|pending| !matches!(pending.effect, Effect::None));
        for pending in early.iter().chain(&late) {
            self.resolve_use(pending);
        }

        self.resolve_type_scopes();

        let fields = std::mem::take(&mut self.fields);
        for field in &fields {
            self.resolve_field(field);
        }
    }

    fn resolve_use(&mut self, pending: &PendingUse) {
        let mut scope = pending.global.then_some(Scopes::FILE);
        let mut resolved = None;
        let last = pending.names.len() - 1;
        for (index, &name) in pending.names.iter().enumerate() {
            let text = self.unit.names[name.0].text.as_str();
            let space = if index == last {
                pending.space
            } else {
                NameSpace::Qualifier
            };
            let binding = match scope {
                Some(scope) => self.scopes.lookup_member(scope, space, text),
                None if index == 0 => self
                    .macro_at(text, pending.position)
                    .or_else(|| self.scopes.lookup(pending.scope, space, text, pending.position)),
                None => None,
            };
            if binding.is_none() {
                log::trace!("Unresolved name '{}' at byte {}", text, pending.position);
            }
            self.unit.names[name.0].binding = binding;
            resolved = binding;
            scope = binding.and_then(|b| self.scope_of(b));
        }

        let Some(binding) = resolved else {
            return;
        };
        match pending.effect {
            Effect::None => {}
            Effect::UsingNamespace(into) => {
                if let Some(used) = self.scope_of(binding) {
                    self.scopes.add_using(into, used);
                }
            }
            Effect::Base(class) => {
                if let Some(base) = self.scope_of(binding) {
                    self.scopes.add_base(class, base);
                }
            }
            Effect::UsingDeclaration { into, position } => {
                let text = self.unit.bindings[binding.0].name.clone();
                if self.scopes.local(into, NameSpace::Ordinary, &text).is_none() {
                    self.scopes
                        .declare(into, NameSpace::Ordinary, &text, binding, position);
                }
            }
        }
    }

    /// Link every typed symbol to the member scope of its type, following
    /// typedef chains.
    fn resolve_type_scopes(&mut self) {
        for _ in 0..MAX_ALIAS_DEPTH {
            let mut changed = false;
            for index in 0..self.unit.bindings.len() {
                let data = &self.unit.bindings[index];
                if data.type_scope.is_some() {
                    continue;
                }
                let Some(type_ref) = data.type_ref else {
                    continue;
                };
                let scope = match type_ref {
                    TypeRef::Specifier(id) => self.specifier_scopes.get(&id).copied(),
                    TypeRef::Name(id) => self
                        .name_by_node
                        .get(&id)
                        .and_then(|name| self.unit.names[name.0].binding)
                        .and_then(|binding| self.scope_of(binding)),
                };
                if scope.is_some() {
                    self.unit.bindings[index].type_scope = scope;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn resolve_field(&mut self, field: &PendingField) {
        let scope = match field.object {
            Some(ObjectRef::Class(scope)) => Some(scope),
            Some(ObjectRef::Name(id)) => self
                .name_by_node
                .get(&id)
                .and_then(|name| self.unit.names[name.0].binding)
                .and_then(|binding| self.unit.bindings[binding.0].type_scope),
            None => None,
        };
        let Some(scope) = scope else {
            return;
        };
        let binding = self.scopes.lookup_member(
            scope,
            NameSpace::Ordinary,
            &self.unit.names[field.name.0].text,
        );
        self.unit.names[field.name.0].binding = binding;
    }

    fn finish(self, declarations_as_references: bool) -> CppUnit {
        let mut unit = self.unit;
        let mut references = vec![Vec::new(); unit.bindings.len()];
        for (index, name) in unit.names.iter().enumerate() {
            if let Some(binding) = name.binding {
                if !name.declaration || declarations_as_references {
                    references[binding.0].push(CppName(index));
                }
            }
        }
        unit.references = references;
        unit
    }
}
