use std::collections::HashMap;
use std::fmt;

/// A half-open byte range `[start, end)` in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// span covering both `self` and `other`
    pub fn to(self, other: SourceSpan) -> SourceSpan {
        SourceSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// The root of the AST, containing all top-level statements
#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Statement>,
    pub span: SourceSpan,
}

/// Every node kind the walker can fire events for.
///
/// Function declarations and function expressions share [`NodeKind::Function`],
/// use [`FnDec::is_declaration`] to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Program,
    VarDecStatement,
    VarDeclarator,
    Function,
    ArrowFunction,
    BlockStatement,
    ExpressionStatement,
    ReturnStatement,
    IfStatement,
    WhileStatement,
    ForStatement,
    EmptyStatement,
    Identifier,
    Literal,
    ArrayLiteral,
    ObjectLiteral,
    Property,
    UnaryExpression,
    UpdateExpression,
    BinaryExpression,
    AssignmentExpression,
    ConditionalExpression,
    CallExpression,
    NewExpression,
    MemberExpression,
    ThisExpression,
    AwaitExpression,
    YieldExpression,
}

impl NodeKind {
    pub const ALL: [NodeKind; 28] = [
        NodeKind::Program,
        NodeKind::VarDecStatement,
        NodeKind::VarDeclarator,
        NodeKind::Function,
        NodeKind::ArrowFunction,
        NodeKind::BlockStatement,
        NodeKind::ExpressionStatement,
        NodeKind::ReturnStatement,
        NodeKind::IfStatement,
        NodeKind::WhileStatement,
        NodeKind::ForStatement,
        NodeKind::EmptyStatement,
        NodeKind::Identifier,
        NodeKind::Literal,
        NodeKind::ArrayLiteral,
        NodeKind::ObjectLiteral,
        NodeKind::Property,
        NodeKind::UnaryExpression,
        NodeKind::UpdateExpression,
        NodeKind::BinaryExpression,
        NodeKind::AssignmentExpression,
        NodeKind::ConditionalExpression,
        NodeKind::CallExpression,
        NodeKind::NewExpression,
        NodeKind::MemberExpression,
        NodeKind::ThisExpression,
        NodeKind::AwaitExpression,
        NodeKind::YieldExpression,
    ];
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A borrowed view of any node in the tree, one variant per concrete node type.
///
/// This is what listeners receive; it is `Copy` so it can be handed around freely
/// while the tree itself stays untouched.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    VarDecStatement(&'a VarDecStatement),
    VarDeclarator(&'a VarDeclarator),
    Function(&'a FnDec),
    ArrowFunction(&'a ArrowFn),
    BlockStatement(&'a BlockStatement),
    ExpressionStatement(&'a ExpressionStatement),
    ReturnStatement(&'a ReturnStatement),
    IfStatement(&'a IfStatement),
    WhileStatement(&'a WhileStatement),
    ForStatement(&'a ForStatement),
    EmptyStatement(&'a EmptyStatement),
    Identifier(&'a Identifier),
    Literal(&'a Literal),
    ArrayLiteral(&'a ArrayLiteral),
    ObjectLiteral(&'a ObjectLiteral),
    Property(&'a Property),
    UnaryExpression(&'a UnaryExpression),
    UpdateExpression(&'a UpdateExpression),
    BinaryExpression(&'a BinaryExpression),
    AssignmentExpression(&'a AssignmentExpression),
    ConditionalExpression(&'a ConditionalExpression),
    CallExpression(&'a CallExpression),
    NewExpression(&'a NewExpression),
    MemberExpression(&'a MemberExpression),
    ThisExpression(&'a ThisExpression),
    AwaitExpression(&'a AwaitExpression),
    YieldExpression(&'a YieldExpression),
}

impl<'a> Node<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Program(_) => NodeKind::Program,
            Node::VarDecStatement(_) => NodeKind::VarDecStatement,
            Node::VarDeclarator(_) => NodeKind::VarDeclarator,
            Node::Function(_) => NodeKind::Function,
            Node::ArrowFunction(_) => NodeKind::ArrowFunction,
            Node::BlockStatement(_) => NodeKind::BlockStatement,
            Node::ExpressionStatement(_) => NodeKind::ExpressionStatement,
            Node::ReturnStatement(_) => NodeKind::ReturnStatement,
            Node::IfStatement(_) => NodeKind::IfStatement,
            Node::WhileStatement(_) => NodeKind::WhileStatement,
            Node::ForStatement(_) => NodeKind::ForStatement,
            Node::EmptyStatement(_) => NodeKind::EmptyStatement,
            Node::Identifier(_) => NodeKind::Identifier,
            Node::Literal(_) => NodeKind::Literal,
            Node::ArrayLiteral(_) => NodeKind::ArrayLiteral,
            Node::ObjectLiteral(_) => NodeKind::ObjectLiteral,
            Node::Property(_) => NodeKind::Property,
            Node::UnaryExpression(_) => NodeKind::UnaryExpression,
            Node::UpdateExpression(_) => NodeKind::UpdateExpression,
            Node::BinaryExpression(_) => NodeKind::BinaryExpression,
            Node::AssignmentExpression(_) => NodeKind::AssignmentExpression,
            Node::ConditionalExpression(_) => NodeKind::ConditionalExpression,
            Node::CallExpression(_) => NodeKind::CallExpression,
            Node::NewExpression(_) => NodeKind::NewExpression,
            Node::MemberExpression(_) => NodeKind::MemberExpression,
            Node::ThisExpression(_) => NodeKind::ThisExpression,
            Node::AwaitExpression(_) => NodeKind::AwaitExpression,
            Node::YieldExpression(_) => NodeKind::YieldExpression,
        }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            Node::Program(n) => n.span,
            Node::VarDecStatement(n) => n.span,
            Node::VarDeclarator(n) => n.span,
            Node::Function(n) => n.span,
            Node::ArrowFunction(n) => n.span,
            Node::BlockStatement(n) => n.span,
            Node::ExpressionStatement(n) => n.span,
            Node::ReturnStatement(n) => n.span,
            Node::IfStatement(n) => n.span,
            Node::WhileStatement(n) => n.span,
            Node::ForStatement(n) => n.span,
            Node::EmptyStatement(n) => n.span,
            Node::Identifier(n) => n.span,
            Node::Literal(n) => n.span,
            Node::ArrayLiteral(n) => n.span,
            Node::ObjectLiteral(n) => n.span,
            Node::Property(n) => n.span,
            Node::UnaryExpression(n) => n.span,
            Node::UpdateExpression(n) => n.span,
            Node::BinaryExpression(n) => n.span,
            Node::AssignmentExpression(n) => n.span,
            Node::ConditionalExpression(n) => n.span,
            Node::CallExpression(n) => n.span,
            Node::NewExpression(n) => n.span,
            Node::MemberExpression(n) => n.span,
            Node::ThisExpression(n) => n.span,
            Node::AwaitExpression(n) => n.span,
            Node::YieldExpression(n) => n.span,
        }
    }
}

impl<'a> From<&'a Statement> for Node<'a> {
    fn from(stmt: &'a Statement) -> Self {
        match stmt {
            Statement::VarDec(s) => Node::VarDecStatement(s),
            Statement::Function(f) => Node::Function(f),
            Statement::Block(b) => Node::BlockStatement(b),
            Statement::Expression(s) => Node::ExpressionStatement(s),
            Statement::Return(s) => Node::ReturnStatement(s),
            Statement::If(s) => Node::IfStatement(s),
            Statement::While(s) => Node::WhileStatement(s),
            Statement::For(s) => Node::ForStatement(s),
            Statement::Empty(s) => Node::EmptyStatement(s),
        }
    }
}

impl<'a> From<&'a Expression> for Node<'a> {
    fn from(expr: &'a Expression) -> Self {
        match expr {
            Expression::Identifier(e) => Node::Identifier(e),
            Expression::Literal(e) => Node::Literal(e),
            Expression::Array(e) => Node::ArrayLiteral(e),
            Expression::Object(e) => Node::ObjectLiteral(e),
            Expression::Function(e) => Node::Function(e),
            Expression::Arrow(e) => Node::ArrowFunction(e),
            Expression::Unary(e) => Node::UnaryExpression(e),
            Expression::Update(e) => Node::UpdateExpression(e),
            Expression::Binary(e) => Node::BinaryExpression(e),
            Expression::Assignment(e) => Node::AssignmentExpression(e),
            Expression::Conditional(e) => Node::ConditionalExpression(e),
            Expression::Call(e) => Node::CallExpression(e),
            Expression::New(e) => Node::NewExpression(e),
            Expression::Member(e) => Node::MemberExpression(e),
            Expression::This(e) => Node::ThisExpression(e),
            Expression::Await(e) => Node::AwaitExpression(e),
            Expression::Yield(e) => Node::YieldExpression(e),
        }
    }
}

impl<'a> From<&'a ForInit> for Node<'a> {
    fn from(init: &'a ForInit) -> Self {
        match init {
            ForInit::VarDec(dec) => Node::VarDecStatement(dec),
            ForInit::Expression(expr) => expr.into(),
        }
    }
}

impl<'a> From<&'a ArrowBody> for Node<'a> {
    fn from(body: &'a ArrowBody) -> Self {
        match body {
            ArrowBody::Block(block) => Node::BlockStatement(block),
            ArrowBody::Expression(expr) => expr.as_ref().into(),
        }
    }
}

/// Statements
#[derive(Debug, Clone)]
pub enum Statement {
    VarDec(VarDecStatement),
    Function(FnDec),
    Block(BlockStatement),
    Expression(ExpressionStatement),
    Return(ReturnStatement),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Empty(EmptyStatement),
}

impl Statement {
    pub fn span(&self) -> SourceSpan {
        Node::from(self).span()
    }
}

/// The keyword a variable declaration was introduced with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `var a = 1, b`, `let a`, `const a = 1`
#[derive(Debug, Clone)]
pub struct VarDecStatement {
    pub kind: DeclarationKind,
    pub declarations: Vec<VarDeclarator>,
    pub span: SourceSpan,
}

impl VarDecStatement {
    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }
}

/// A single `name = init` entry of a declaration list
#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub id: Identifier,
    pub init: Option<Expression>,
    pub span: SourceSpan,
}

/// Whether a function was written as a statement or inside an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnForm {
    Declaration,
    Expression,
}

/// A function declaration or function expression
#[derive(Debug, Clone)]
pub struct FnDec {
    pub id: Option<Identifier>,
    pub params: Vec<Identifier>,
    pub body: BlockStatement,
    pub is_async: bool,
    pub is_generator: bool,
    pub form: FnForm,
    pub span: SourceSpan,
}

impl FnDec {
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    pub fn is_generator(&self) -> bool {
        self.is_generator
    }

    pub fn is_declaration(&self) -> bool {
        self.form == FnForm::Declaration
    }
}

/// `(a, b) => body`
#[derive(Debug, Clone)]
pub struct ArrowFn {
    pub params: Vec<Identifier>,
    pub body: ArrowBody,
    pub is_async: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub enum ArrowBody {
    Block(BlockStatement),
    Expression(Box<Expression>),
}

#[derive(Debug, Clone)]
pub struct BlockStatement {
    pub body: Vec<Statement>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    pub span: SourceSpan,
}

/// An if statement (with optional else)
#[derive(Debug, Clone)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
    pub span: SourceSpan,
}

/// A C-style `for (init; test; update) body` loop
#[derive(Debug, Clone)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub enum ForInit {
    VarDec(VarDecStatement),
    Expression(Expression),
}

#[derive(Debug, Clone)]
pub struct EmptyStatement {
    pub span: SourceSpan,
}

/// Expressions
#[derive(Debug, Clone)]
pub enum Expression {
    Identifier(Identifier),
    Literal(Literal),
    Array(ArrayLiteral),
    Object(ObjectLiteral),
    Function(FnDec),
    Arrow(ArrowFn),
    Unary(UnaryExpression),
    Update(UpdateExpression),
    Binary(BinaryExpression),
    Assignment(AssignmentExpression),
    Conditional(ConditionalExpression),
    Call(CallExpression),
    New(NewExpression),
    Member(MemberExpression),
    This(ThisExpression),
    Await(AwaitExpression),
    Yield(YieldExpression),
}

impl Expression {
    pub fn span(&self) -> SourceSpan {
        Node::from(self).span()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ArrayLiteral {
    pub elements: Vec<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ObjectLiteral {
    pub properties: Vec<Property>,
    pub span: SourceSpan,
}

/// `key: value` inside an object literal, the key is an identifier or a literal
#[derive(Debug, Clone)]
pub struct Property {
    pub key: Expression,
    pub value: Expression,
    pub span: SourceSpan,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Positive,
    Negative,
    Not,
    Typeof,
}

#[derive(Debug, Clone)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub argument: Box<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

/// `++x`, `x--`
#[derive(Debug, Clone)]
pub struct UpdateExpression {
    pub operator: UpdateOperator,
    pub prefix: bool,
    pub argument: Box<Expression>,
    pub span: SourceSpan,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    // Comparison
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // Logical
    And,
    Or,
}

#[derive(Debug, Clone)]
pub struct BinaryExpression {
    pub left: Box<Expression>,
    pub operator: BinaryOperator,
    pub right: Box<Expression>,
    pub span: SourceSpan,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignmentOperator {
    Simple,   // =
    Add,      // +=
    Subtract, // -=
    Multiply, // *=
    Divide,   // /=
}

#[derive(Debug, Clone)]
pub struct AssignmentExpression {
    pub left: Box<Expression>,
    pub operator: AssignmentOperator,
    pub right: Box<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub span: SourceSpan,
}

/// `object.property` or, when `computed`, `object[property]`
#[derive(Debug, Clone)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: Box<Expression>,
    pub computed: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ThisExpression {
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct AwaitExpression {
    pub argument: Box<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct YieldExpression {
    pub argument: Option<Box<Expression>>,
    pub span: SourceSpan,
}

/// A symbol table to track bindings across the program
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: HashMap<ScopeId, Scope>,
    next_scope_id: usize,
    global_scope_id: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            scopes: HashMap::new(),
            next_scope_id: 0,
            global_scope_id: ScopeId(0),
        };

        table.create_scope(None, ScopeKind::Program); // global scope
        table
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global_scope_id
    }

    pub fn create_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.next_scope_id);
        self.next_scope_id += 1;

        let scope = Scope {
            id,
            parent,
            kind,
            symbols: HashMap::new(),
        };

        self.scopes.insert(id, scope);
        id
    }

    pub fn scope(&self, scope_id: ScopeId) -> Option<&Scope> {
        self.scopes.get(&scope_id)
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn get_parent_scope(&self, scope_id: ScopeId) -> Option<ScopeId> {
        self.scopes.get(&scope_id).and_then(|scope| scope.parent)
    }

    /// Nearest enclosing scope that `var` declarations hoist to
    pub fn function_scope(&self, scope_id: ScopeId) -> ScopeId {
        let mut current = scope_id;
        while let Some(scope) = self.scopes.get(&current) {
            match (scope.kind, scope.parent) {
                (ScopeKind::Block, Some(parent)) => current = parent,
                _ => break,
            }
        }
        current
    }

    /// Binds `symbol` in `scope_id`.
    ///
    /// Function-scoped bindings (`var`, parameters, function declarations) may
    /// be redeclared freely, a lexical binding (`let`/`const`) may not share its
    /// name with any other binding of the same scope.
    pub fn add_symbol(&mut self, scope_id: ScopeId, symbol: Symbol) -> Result<(), String> {
        let Some(scope) = self.scopes.get_mut(&scope_id) else {
            return Err(format!("Scope '{:?}' not found", scope_id));
        };

        if let Some(existing) = scope.symbols.get(symbol.name()) {
            if existing.is_lexical() || symbol.is_lexical() {
                return Err(format!(
                    "Identifier '{}' has already been declared",
                    symbol.name()
                ));
            }
            // first declaration wins for redeclared vars
            return Ok(());
        }

        scope.symbols.insert(symbol.name().to_string(), symbol);
        Ok(())
    }

    /// Looks `name` up in `scope_id` only, ignoring parents
    pub fn lookup_local(&self, scope_id: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes.get(&scope_id)?.symbols.get(name)
    }

    pub fn lookup_symbol(&self, scope_id: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope_id);

        while let Some(id) = current {
            if let Some(scope) = self.scopes.get(&id) {
                if let Some(symbol) = scope.symbols.get(name) {
                    return Some(symbol);
                }
                current = scope.parent;
            } else {
                return None;
            }
        }

        None
    }
}

/// unique id for each scope encountered while parsing, id = 0 is always global scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Program,
    Function,
    Block,
}

/// a unique scope identified by it's `ScopeId`
#[derive(Debug, Clone)]
pub struct Scope {
    id: ScopeId,
    parent: Option<ScopeId>,
    kind: ScopeKind,
    symbols: HashMap<String, Symbol>,
}

impl Scope {
    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

/// Something a name can be bound to
#[derive(Debug, Clone)]
pub enum Symbol {
    Function(FunctionSymbol),
    Variable(VariableSymbol),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Function(f) => &f.name,
            Symbol::Variable(v) => &v.name,
        }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            Symbol::Function(f) => f.span,
            Symbol::Variable(v) => v.span,
        }
    }

    /// `let` and `const` bindings
    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            Symbol::Variable(VariableSymbol {
                binding: BindingKind::Let | BindingKind::Const,
                ..
            })
        )
    }
}

/// Symbol representing a function declaration
#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: String,
    pub is_async: bool,
    pub is_generator: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Parameter,
}

impl From<DeclarationKind> for BindingKind {
    fn from(kind: DeclarationKind) -> Self {
        match kind {
            DeclarationKind::Var => BindingKind::Var,
            DeclarationKind::Let => BindingKind::Let,
            DeclarationKind::Const => BindingKind::Const,
        }
    }
}

/// Symbol representing a variable or parameter
#[derive(Debug, Clone)]
pub struct VariableSymbol {
    pub name: String,
    pub binding: BindingKind,
    pub span: SourceSpan,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, binding: BindingKind) -> Symbol {
        Symbol::Variable(VariableSymbol {
            name: name.to_string(),
            binding,
            span: SourceSpan::default(),
        })
    }

    #[test]
    fn test_var_redeclaration_is_allowed() {
        let mut table = SymbolTable::new();
        let global = table.global_scope();
        assert!(table.add_symbol(global, var("a", BindingKind::Var)).is_ok());
        assert!(table.add_symbol(global, var("a", BindingKind::Var)).is_ok());
    }

    #[test]
    fn test_lexical_redeclaration_is_rejected() {
        let mut table = SymbolTable::new();
        let global = table.global_scope();
        table.add_symbol(global, var("a", BindingKind::Let)).unwrap();
        let err = table
            .add_symbol(global, var("a", BindingKind::Var))
            .unwrap_err();
        assert_eq!(err, "Identifier 'a' has already been declared");
    }

    #[test]
    fn test_lookup_walks_parents() {
        let mut table = SymbolTable::new();
        let global = table.global_scope();
        let func = table.create_scope(Some(global), ScopeKind::Function);
        let block = table.create_scope(Some(func), ScopeKind::Block);
        table.add_symbol(global, var("g", BindingKind::Const)).unwrap();

        assert!(table.lookup_symbol(block, "g").is_some());
        assert!(table.lookup_local(block, "g").is_none());
        assert!(table.lookup_symbol(global, "missing").is_none());
        assert_eq!(table.function_scope(block), func);
        assert_eq!(table.function_scope(global), global);
        assert_eq!(table.scope_count(), 3);
    }
}
