//! Extraction of attribute records from a single PHP file.
//!
//! A file is parsed once by the declaration-level parser and once by the
//! regex outline; only type declarations that both passes agree on are
//! extracted. A type whose declaration fails to parse is skipped and the rest
//! of the file is still extracted.

use crate::error::DiscoveryError;
use attrix_common::{ArgumentValue, AttributeRecord, TargetDescriptor, TargetKind};
use attrix_config::AutoloadRoot;
use attrix_diagnostics::DiagnosticSink;
use attrix_php_parser::ast::{AttributeGroup, Expr, Item, Member, MethodDecl, TypeDecl};
use attrix_php_parser::{
    declared_type_names, parse_source, ConstEvaluator, NameResolver, SymbolLookup,
};
use attrix_source::{LoadError, SourceFile};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bound on `extends` chains followed while looking for a constructor or a
/// class constant.
const MAX_INHERITANCE_DEPTH: usize = 16;

/// Turns PHP files into attribute records.
///
/// Positional attribute arguments are keyed by the attribute constructor's
/// parameter names, and `Type::NAME` arguments take the constant's declared
/// value. Both are looked up in the file being parsed, then through the PSR-4
/// autoload roots; external lookups are cached for the lifetime of the parser.
#[derive(Debug, Default)]
pub struct AttributeParser {
    autoload: Vec<AutoloadRoot>,
    signatures: RefCell<HashMap<String, Option<Vec<String>>>>,
    /// Keyed by `lowercased-class::NAME`.
    constants: RefCell<HashMap<String, Option<ArgumentValue>>>,
}

impl AttributeParser {
    /// Creates a parser that resolves external declarations through `autoload`.
    pub fn new(autoload: Vec<AutoloadRoot>) -> Self {
        Self {
            autoload,
            signatures: RefCell::new(HashMap::new()),
            constants: RefCell::new(HashMap::new()),
        }
    }

    /// Extracts every attribute occurrence in the file at `path`.
    ///
    /// Fails only if the file does not exist or its metadata cannot be read.
    /// A file that cannot be read or decoded yields no records.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<AttributeRecord>, DiscoveryError> {
        self.parse_file_report(path).map(|report| report.records)
    }

    /// Like [`parse_file`](Self::parse_file), but also reports whether the
    /// file could be read and parsed without errors.
    pub fn parse_file_report(&self, path: &Path) -> Result<FileReport, DiscoveryError> {
        let file = match SourceFile::load(path) {
            Ok(file) => file,
            Err(LoadError::NotFound { path }) => return Err(DiscoveryError::FileNotFound { path }),
            Err(LoadError::Metadata { path, source }) => {
                return Err(DiscoveryError::Io { path, source })
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "skipping unreadable file");
                return Ok(FileReport {
                    records: Vec::new(),
                    problem: Some(err.to_string()),
                });
            }
        };
        Ok(self.extract_report(&file))
    }

    /// Extracts every attribute occurrence in an already loaded file.
    pub fn extract(&self, file: &SourceFile) -> Vec<AttributeRecord> {
        self.extract_report(file).records
    }

    fn extract_report(&self, file: &SourceFile) -> FileReport {
        let sink = DiagnosticSink::new();
        let ast = parse_source(file, &sink);
        let errors = sink.error_count();
        for diagnostic in sink.take_all() {
            debug!(path = %file.path.display(), "{}", diagnostic.render(file));
        }

        let declared: HashSet<String> = declared_type_names(&file.content)
            .into_iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        let symbols = FileSymbols::new(&file.content, &ast.items, self);
        let context = FileContext {
            file,
            source_file: std::path::absolute(&file.path).unwrap_or_else(|_| file.path.clone()),
            content_hash: file.content_hash.to_hex(),
        };

        let mut records = Vec::new();
        visit_types(&ast.items, NameResolver::new(None), &mut |decl, resolver| {
            let fqn = resolver.qualify(&decl.name);
            if !declared.contains(&fqn.to_ascii_lowercase()) {
                debug!(path = %file.path.display(), class = %fqn, "type not confirmed by outline");
                return;
            }
            let mut names = resolver.clone();
            let parent = decl.extends.as_ref().map(|n| resolver.resolve_class(n));
            names.enter_class(fqn.clone(), parent);
            let mut extractor = TypeExtractor {
                context: &context,
                symbols: &symbols,
                names: &names,
                owner_type: &fqn,
                short_name: &decl.name,
                records: &mut records,
            };
            extractor.extract(decl);
        });
        FileReport {
            records,
            problem: (errors > 0).then(|| format!("{errors} syntax error(s)")),
        }
    }

    fn constructor_in(
        &self,
        local: &HashMap<String, LocalType>,
        class: &str,
        depth: usize,
    ) -> Option<Vec<String>> {
        if depth >= MAX_INHERITANCE_DEPTH {
            return None;
        }
        match local.get(&class.to_ascii_lowercase()) {
            Some(LocalType {
                constructor: Some(params),
                ..
            }) => Some(params.clone()),
            Some(LocalType {
                parent: Some(parent),
                ..
            }) => self.constructor_in(local, parent, depth + 1),
            Some(_) => None,
            None => self.external_constructor(class, depth),
        }
    }

    fn external_constructor(&self, class: &str, depth: usize) -> Option<Vec<String>> {
        let key = class.to_ascii_lowercase();
        if let Some(cached) = self.signatures.borrow().get(&key) {
            return cached.clone();
        }
        let found = self.load_constructor(class, depth);
        self.signatures.borrow_mut().insert(key, found.clone());
        found
    }

    fn load_constructor(&self, class: &str, depth: usize) -> Option<Vec<String>> {
        let file = self.load_declaring_file(class)?;
        let ast = parse_source(&file, &DiagnosticSink::new());
        let local = local_types(&ast.items);
        if !local.contains_key(&class.to_ascii_lowercase()) {
            debug!(class, path = %file.path.display(), "autoload file does not declare class");
            return None;
        }
        self.constructor_in(&local, class, depth + 1)
    }

    fn constant_in(
        &self,
        symbols: &FileSymbols<'_>,
        class: &str,
        name: &str,
        depth: usize,
    ) -> Option<ArgumentValue> {
        if depth >= MAX_INHERITANCE_DEPTH {
            return None;
        }
        let Some(ty) = symbols.local.get(&class.to_ascii_lowercase()) else {
            return self.external_constant(class, name, depth);
        };
        if ty.cases.contains(name) {
            return Some(ArgumentValue::EnumCase {
                enum_type: ty.name.clone(),
                case: name.to_string(),
            });
        }
        match ty.constants.get(name) {
            Some(initializer) => symbols.evaluate(ty, name, initializer),
            None => ty
                .parent
                .as_deref()
                .and_then(|parent| self.constant_in(symbols, parent, name, depth + 1)),
        }
    }

    fn external_constant(&self, class: &str, name: &str, depth: usize) -> Option<ArgumentValue> {
        let key = format!("{}::{name}", class.to_ascii_lowercase());
        if let Some(cached) = self.constants.borrow().get(&key) {
            return cached.clone();
        }
        // Reserve the entry so a reference cycle across files ends here.
        self.constants.borrow_mut().insert(key.clone(), None);
        let found = self.load_constant(class, name, depth);
        self.constants.borrow_mut().insert(key, found.clone());
        found
    }

    fn load_constant(&self, class: &str, name: &str, depth: usize) -> Option<ArgumentValue> {
        let file = self.load_declaring_file(class)?;
        let ast = parse_source(&file, &DiagnosticSink::new());
        let symbols = FileSymbols::new(&file.content, &ast.items, self);
        if !symbols.local.contains_key(&class.to_ascii_lowercase()) {
            debug!(class, path = %file.path.display(), "autoload file does not declare class");
            return None;
        }
        self.constant_in(&symbols, class, name, depth + 1)
    }

    fn load_declaring_file(&self, class: &str) -> Option<SourceFile> {
        let path = self.autoload_path(class)?;
        match SourceFile::load(&path) {
            Ok(file) => Some(file),
            Err(err) => {
                debug!(class, error = %err, "cannot load class file");
                None
            }
        }
    }

    /// Maps a class name to an existing file through the PSR-4 roots.
    fn autoload_path(&self, class: &str) -> Option<PathBuf> {
        self.autoload.iter().find_map(|root| {
            let relative = class.strip_prefix(root.prefix.as_str())?;
            let path = root.dir.join(format!("{}.php", relative.replace('\\', "/")));
            path.is_file().then_some(path)
        })
    }
}

/// The records of one file and the reason it was only partly processed.
#[derive(Debug, Default)]
pub struct FileReport {
    /// Extracted records.
    pub records: Vec<AttributeRecord>,
    /// Set when the file could not be read or had syntax errors.
    pub problem: Option<String>,
}

/// What symbol lookup needs to know about a type declared in a file.
#[derive(Debug)]
struct LocalType {
    /// Fully-qualified name as declared.
    name: String,
    /// Parameter names of the declared constructor, up to a variadic one.
    constructor: Option<Vec<String>>,
    /// Resolved parent class.
    parent: Option<String>,
    /// Names as seen from inside the type's body.
    names: NameResolver,
    /// Constant initializers by name.
    constants: HashMap<String, Expr>,
    /// Enum case names.
    cases: HashSet<String>,
}

/// Symbol lookup for one file: its own types first, then the parser's
/// autoload roots.
struct FileSymbols<'a> {
    source: &'a str,
    local: HashMap<String, LocalType>,
    parser: &'a AttributeParser,
    /// Constants whose initializers are being evaluated, as `class::NAME`.
    evaluating: RefCell<Vec<String>>,
}

impl<'a> FileSymbols<'a> {
    fn new(source: &'a str, items: &[Item], parser: &'a AttributeParser) -> Self {
        Self {
            source,
            local: local_types(items),
            parser,
            evaluating: RefCell::new(Vec::new()),
        }
    }

    /// Evaluates the initializer of `ty::name`; `None` on a reference cycle.
    fn evaluate(&self, ty: &LocalType, name: &str, initializer: &Expr) -> Option<ArgumentValue> {
        let key = format!("{}::{name}", ty.name.to_ascii_lowercase());
        if self.evaluating.borrow().contains(&key) {
            debug!(constant = %key, "constant refers to itself");
            return None;
        }
        self.evaluating.borrow_mut().push(key);
        let value = ConstEvaluator::new(self.source, &ty.names, self).evaluate(initializer);
        self.evaluating.borrow_mut().pop();
        Some(value)
    }
}

impl SymbolLookup for FileSymbols<'_> {
    fn constructor_params(&self, class: &str) -> Option<Vec<String>> {
        self.parser.constructor_in(&self.local, class, 0)
    }

    fn class_constant(&self, class: &str, name: &str) -> Option<ArgumentValue> {
        self.parser.constant_in(self, class, name, 0)
    }
}

/// Calls `visit` for every type declaration with the name resolver in effect
/// at that point of the file.
fn visit_types<'a, F>(items: &'a [Item], mut resolver: NameResolver, visit: &mut F)
where
    F: FnMut(&'a TypeDecl, &NameResolver),
{
    for item in items {
        match item {
            Item::Namespace(ns) => match &ns.body {
                Some(body) => visit_types(body, NameResolver::new(ns.name.as_deref()), visit),
                None => resolver = NameResolver::new(ns.name.as_deref()),
            },
            Item::Use(decl) => decl.clauses.iter().for_each(|c| resolver.add_import(c)),
            Item::Type(decl) => visit(decl, &resolver),
            Item::Error(_) => {}
        }
    }
}

/// Indexes the types of a file by lower-cased fully-qualified name.
fn local_types(items: &[Item]) -> HashMap<String, LocalType> {
    let mut types = HashMap::new();
    visit_types(items, NameResolver::new(None), &mut |decl, resolver| {
        let constructor = decl.constructor().map(|ctor| {
            ctor.params
                .iter()
                .take_while(|p| !p.variadic)
                .map(|p| p.name.clone())
                .collect()
        });
        let name = resolver.qualify(&decl.name);
        let parent = decl.extends.as_ref().map(|n| resolver.resolve_class(n));
        let mut names = resolver.clone();
        names.enter_class(name.clone(), parent.clone());
        let mut constants = HashMap::new();
        let mut cases = HashSet::new();
        for member in &decl.members {
            match member {
                Member::Constant(constant) => {
                    for entry in &constant.entries {
                        constants.insert(entry.name.clone(), entry.value.clone());
                    }
                }
                Member::EnumCase(case) => {
                    cases.insert(case.name.clone());
                }
                _ => {}
            }
        }
        types.insert(
            name.to_ascii_lowercase(),
            LocalType {
                name,
                constructor,
                parent,
                names,
                constants,
                cases,
            },
        );
    });
    types
}

struct FileContext<'a> {
    file: &'a SourceFile,
    source_file: PathBuf,
    content_hash: String,
}

struct TypeExtractor<'a> {
    context: &'a FileContext<'a>,
    symbols: &'a dyn SymbolLookup,
    names: &'a NameResolver,
    owner_type: &'a str,
    short_name: &'a str,
    records: &'a mut Vec<AttributeRecord>,
}

impl TypeExtractor<'_> {
    fn extract(&mut self, decl: &TypeDecl) {
        let line = self.line(decl.keyword_span.start);
        self.push(&decl.attributes, TargetDescriptor::class(self.short_name), line);

        for member in &decl.members {
            if let Member::Method(method) = member {
                let line = self.line(method.keyword_span.start);
                self.push_member(&method.attributes, TargetKind::Method, &method.name, line);
            }
        }
        for member in &decl.members {
            if let Member::Property(property) = member {
                for name in &property.names {
                    self.push_member(&property.attributes, TargetKind::Property, name, 0);
                }
            }
        }
        if let Some(ctor) = decl.constructor() {
            for param in ctor.params.iter().filter(|p| p.promoted) {
                self.push_member(&param.attributes, TargetKind::Property, &param.name, 0);
            }
        }
        for member in &decl.members {
            if let Member::Method(method) = member {
                self.push_parameters(method);
            }
        }
        for member in &decl.members {
            match member {
                Member::Constant(constant) => {
                    for entry in &constant.entries {
                        self.push_member(&constant.attributes, TargetKind::Constant, &entry.name, 0);
                    }
                }
                Member::EnumCase(case) => {
                    self.push_member(&case.attributes, TargetKind::Constant, &case.name, 0);
                }
                _ => {}
            }
        }
    }

    /// Parameters of `method`; promoted constructor parameters are reported
    /// as properties instead.
    fn push_parameters(&mut self, method: &MethodDecl) {
        let is_constructor = method.name.eq_ignore_ascii_case("__construct");
        for param in &method.params {
            if is_constructor && param.promoted {
                continue;
            }
            self.push_member(&param.attributes, TargetKind::Parameter, &param.name, 0);
        }
    }

    fn push_member(&mut self, groups: &[AttributeGroup], kind: TargetKind, name: &str, line: u32) {
        let target = TargetDescriptor::member(kind, name, self.short_name);
        self.push(groups, target, line);
    }

    fn push(&mut self, groups: &[AttributeGroup], target: TargetDescriptor, line: u32) {
        let evaluator = ConstEvaluator::new(&self.context.file.content, self.names, self.symbols);
        for attribute in groups.iter().flat_map(|g| &g.attributes) {
            let attribute_type = self.names.resolve_class(&attribute.name);
            let arguments = evaluator.arguments(&attribute_type, &attribute.args);
            self.records.push(AttributeRecord {
                owner_type: self.owner_type.to_string(),
                attribute_type,
                arguments,
                source_file: self.context.source_file.clone(),
                line_number: line,
                target: target.clone(),
                file_modified_at: self.context.file.modified_at,
                file_content_hash: self.context.content_hash.clone(),
                owning_plugin_name: None,
            });
        }
    }

    fn line(&self, offset: u32) -> u32 {
        self.context.file.line_of(offset)
    }
}
