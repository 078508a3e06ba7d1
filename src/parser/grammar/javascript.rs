//! JavaScript / TypeScript / TSX structure extraction via AST traversal.
//!
//! One walker serves all three grammars; the node kinds they share cover
//! everything we extract. TS-only declarations (interfaces, type aliases)
//! are not structural for the dependency graph and are skipped.

use tree_sitter::Node;

use super::{has_token, line_range, push_unique, strip_quotes, text, Extraction};
use crate::parser::types::{Class, Function, ImportKind, ImportStatement, MethodKind};

pub fn extract(root: &Node, src: &[u8]) -> Extraction {
    let mut out = Extraction::default();

    collect_imports(root, src, &mut out.imports);

    for i in 0..root.named_child_count() {
        let Some(node) = root.named_child(i) else { continue };
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                out.functions.push(function(&node, src));
            }
            "class_declaration" | "abstract_class_declaration" => {
                out.classes.push(class(&node, src));
            }
            "lexical_declaration" | "variable_declaration" => {
                collect_function_bindings(&node, src, &mut out.functions);
            }
            "export_statement" => {
                // export function f() {} / export class C {} / export const f = ...
                if let Some(decl) = node.child_by_field_name("declaration") {
                    match decl.kind() {
                        "function_declaration" | "generator_function_declaration" => {
                            out.functions.push(function(&decl, src));
                        }
                        "class_declaration" | "abstract_class_declaration" => {
                            out.classes.push(class(&decl, src));
                        }
                        "lexical_declaration" | "variable_declaration" => {
                            collect_function_bindings(&decl, src, &mut out.functions);
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    out
}

/// `const handler = async (req) => { ... }` and friends.
fn collect_function_bindings(decl: &Node, src: &[u8], functions: &mut Vec<Function>) {
    for i in 0..decl.named_child_count() {
        let Some(declarator) = decl.named_child(i) else { continue };
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(value) = declarator.child_by_field_name("value") else { continue };
        if !matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
            continue;
        }
        let name = declarator
            .child_by_field_name("name")
            .map(|n| text(&n, src).to_string())
            .unwrap_or_default();
        let (line_start, line_end) = line_range(&declarator);
        let mut func = Function::new(name, line_start, line_end);
        func.is_async = has_token(&value, "async");
        if let Some(params) = value.child_by_field_name("parameters") {
            func.parameters = parameters(&params, src);
        } else if let Some(param) = value.child_by_field_name("parameter") {
            // Single-identifier arrow function: `x => x + 1`
            func.parameters = vec![text(&param, src).to_string()];
        }
        if let Some(body) = value.child_by_field_name("body") {
            collect_calls(&body, src, &mut func.calls);
        }
        functions.push(func);
    }
}

fn function(node: &Node, src: &[u8]) -> Function {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(&n, src).to_string())
        .unwrap_or_default();
    let (line_start, line_end) = line_range(node);
    let mut func = Function::new(name, line_start, line_end);
    func.is_async = has_token(node, "async");
    if let Some(params) = node.child_by_field_name("parameters") {
        func.parameters = parameters(&params, src);
    }
    if let Some(body) = node.child_by_field_name("body") {
        collect_calls(&body, src, &mut func.calls);
    }
    func
}

fn class(node: &Node, src: &[u8]) -> Class {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(&n, src).to_string())
        .unwrap_or_default();
    let (line_start, line_end) = line_range(node);
    let mut cls = Class::new(name, line_start, line_end);

    // `extends Base` lives in a class_heritage child; TypeScript wraps the
    // bases in extends/implements clauses, JavaScript does not.
    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        if child.kind() == "class_heritage" {
            for j in 0..child.named_child_count() {
                let Some(base) = child.named_child(j) else { continue };
                match base.kind() {
                    "extends_clause" | "implements_clause" => {
                        for k in 0..base.named_child_count() {
                            if let Some(b) = base.named_child(k) {
                                if b.kind() != "type_arguments" {
                                    push_unique(&mut cls.bases, text(&b, src).to_string());
                                }
                            }
                        }
                    }
                    _ => push_unique(&mut cls.bases, text(&base, src).to_string()),
                }
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut pending_decorators: Vec<String> = Vec::new();
        for i in 0..body.named_child_count() {
            let Some(member) = body.named_child(i) else { continue };
            match member.kind() {
                "decorator" => {
                    if let Some(expr) = member.named_child(0) {
                        let name = if expr.kind() == "call_expression" {
                            expr.child_by_field_name("function")
                                .map(|f| text(&f, src).to_string())
                                .unwrap_or_default()
                        } else {
                            text(&expr, src).to_string()
                        };
                        push_unique(&mut pending_decorators, name);
                    }
                }
                "method_definition" => {
                    let mut method = function(&member, src);
                    method.method_kind = Some(if has_token(&member, "static") {
                        MethodKind::Static
                    } else {
                        MethodKind::Instance
                    });
                    method.decorators = std::mem::take(&mut pending_decorators);
                    cls.methods.push(method);
                }
                _ => pending_decorators.clear(),
            }
        }
    }

    cls
}

fn parameters(params: &Node, src: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    for i in 0..params.named_child_count() {
        let Some(p) = params.named_child(i) else { continue };
        match p.kind() {
            "identifier" => out.push(text(&p, src).to_string()),
            "assignment_pattern" => {
                if let Some(left) = p.child_by_field_name("left") {
                    out.push(text(&left, src).to_string());
                }
            }
            "rest_pattern" => {
                if let Some(id) = p.named_child(0) {
                    out.push(format!("...{}", text(&id, src)));
                }
            }
            // TypeScript wraps every parameter.
            "required_parameter" | "optional_parameter" => {
                if let Some(pattern) = p.child_by_field_name("pattern") {
                    if pattern.kind() == "rest_pattern" {
                        if let Some(id) = pattern.named_child(0) {
                            out.push(format!("...{}", text(&id, src)));
                        }
                    } else {
                        out.push(text(&pattern, src).to_string());
                    }
                }
            }
            "object_pattern" | "array_pattern" => out.push(text(&p, src).to_string()),
            _ => {}
        }
    }
    out
}

fn collect_calls(node: &Node, src: &[u8], calls: &mut Vec<String>) {
    if node.kind() == "call_expression" {
        if let Some(func) = node.child_by_field_name("function") {
            let name = match func.kind() {
                "identifier" => text(&func, src).to_string(),
                "member_expression" => func
                    .child_by_field_name("property")
                    .map(|p| text(&p, src).to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            };
            // require() and import() are imports, not calls.
            if name != "require" && name != "import" {
                push_unique(calls, name);
            }
        }
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_calls(&child, src, calls);
        }
    }
}

fn collect_imports(node: &Node, src: &[u8], imports: &mut Vec<ImportStatement>) {
    match node.kind() {
        "import_statement" => {
            let Some(source_node) = node.child_by_field_name("source") else { return };
            let specifier = strip_quotes(text(&source_node, src));
            let kind = if specifier.starts_with('.') {
                ImportKind::Relative
            } else {
                ImportKind::Absolute
            };
            let mut items = Vec::new();
            for i in 0..node.named_child_count() {
                let Some(child) = node.named_child(i) else { continue };
                if child.kind() == "import_clause" {
                    collect_import_clause(&child, src, &mut items);
                }
            }
            imports.push(ImportStatement {
                raw_specifier: specifier,
                kind,
                imported_items: items,
            });
        }
        "export_statement" => {
            // Re-exports (`export { x } from "./mod"`) are dependencies too.
            if let Some(source_node) = node.child_by_field_name("source") {
                let specifier = strip_quotes(text(&source_node, src));
                let kind = if specifier.starts_with('.') {
                    ImportKind::Relative
                } else {
                    ImportKind::Absolute
                };
                let mut items = Vec::new();
                for i in 0..node.named_child_count() {
                    let Some(child) = node.named_child(i) else { continue };
                    match child.kind() {
                        "export_clause" => {
                            for j in 0..child.named_child_count() {
                                if let Some(spec) = child.named_child(j) {
                                    if let Some(name) = spec.child_by_field_name("name") {
                                        push_unique(&mut items, text(&name, src).to_string());
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
                if items.is_empty() {
                    items.push("*".to_string());
                }
                imports.push(ImportStatement {
                    raw_specifier: specifier,
                    kind,
                    imported_items: items,
                });
            }
            // Fall through for declarations inside the export.
            for i in 0..node.child_count() {
                if let Some(child) = node.child(i) {
                    collect_imports(&child, src, imports);
                }
            }
        }
        "call_expression" => {
            if let Some(import) = require_or_dynamic(node, src) {
                imports.push(import);
            }
            for i in 0..node.child_count() {
                if let Some(child) = node.child(i) {
                    collect_imports(&child, src, imports);
                }
            }
        }
        _ => {
            for i in 0..node.child_count() {
                if let Some(child) = node.child(i) {
                    collect_imports(&child, src, imports);
                }
            }
        }
    }
}

fn collect_import_clause(clause: &Node, src: &[u8], items: &mut Vec<String>) {
    for i in 0..clause.named_child_count() {
        let Some(child) = clause.named_child(i) else { continue };
        match child.kind() {
            "identifier" => push_unique(items, text(&child, src).to_string()),
            "named_imports" => {
                for j in 0..child.named_child_count() {
                    if let Some(spec) = child.named_child(j) {
                        if let Some(name) = spec.child_by_field_name("name") {
                            push_unique(items, text(&name, src).to_string());
                        }
                    }
                }
            }
            "namespace_import" => push_unique(items, "*".to_string()),
            _ => {}
        }
    }
}

/// `require("x")` and `import("x")` with a literal string argument.
fn require_or_dynamic(call: &Node, src: &[u8]) -> Option<ImportStatement> {
    let func = call.child_by_field_name("function")?;
    let kind = match func.kind() {
        "identifier" if text(&func, src) == "require" => ImportKind::Require,
        "import" => ImportKind::Dynamic,
        _ => return None,
    };
    let args = call.child_by_field_name("arguments")?;
    for i in 0..args.named_child_count() {
        let Some(arg) = args.named_child(i) else { continue };
        if arg.kind() == "string" {
            return Some(ImportStatement {
                raw_specifier: strip_quotes(text(&arg, src)),
                kind,
                imported_items: Vec::new(),
            });
        }
    }
    None
}
