//! Python structure extraction via AST traversal.

use tree_sitter::Node;

use super::{has_token, line_range, push_unique, text, Extraction};
use crate::parser::types::{Class, Function, ImportKind, ImportStatement, MethodKind};

pub fn extract(root: &Node, src: &[u8]) -> Extraction {
    let mut out = Extraction::default();

    // Imports can appear at any depth (conditional imports are common).
    collect_imports(root, src, &mut out.imports);

    // Declarations: top level only; methods are reached through their class.
    for i in 0..root.named_child_count() {
        let Some(node) = root.named_child(i) else { continue };
        match node.kind() {
            "function_definition" => {
                out.functions.push(function(&node, src, Vec::new(), false));
            }
            "class_definition" => {
                out.classes.push(class(&node, src));
            }
            "decorated_definition" => {
                let decorators = decorator_names(&node, src);
                if let Some(def) = node.child_by_field_name("definition") {
                    match def.kind() {
                        "function_definition" => {
                            out.functions.push(function(&def, src, decorators, false));
                        }
                        "class_definition" => out.classes.push(class(&def, src)),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    out
}

fn function(node: &Node, src: &[u8], decorators: Vec<String>, method: bool) -> Function {
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

    if method {
        func.method_kind = Some(if decorators.iter().any(|d| d == "staticmethod") {
            MethodKind::Static
        } else if decorators.iter().any(|d| d == "classmethod") {
            MethodKind::Class
        } else {
            MethodKind::Instance
        });
    }
    func.decorators = decorators;
    func
}

fn class(node: &Node, src: &[u8]) -> Class {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(&n, src).to_string())
        .unwrap_or_default();
    let (line_start, line_end) = line_range(node);
    let mut cls = Class::new(name, line_start, line_end);

    if let Some(supers) = node.child_by_field_name("superclasses") {
        for i in 0..supers.named_child_count() {
            if let Some(base) = supers.named_child(i) {
                push_unique(&mut cls.bases, text(&base, src).to_string());
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        for i in 0..body.named_child_count() {
            let Some(member) = body.named_child(i) else { continue };
            match member.kind() {
                "function_definition" => {
                    cls.methods.push(function(&member, src, Vec::new(), true));
                }
                "decorated_definition" => {
                    let decorators = decorator_names(&member, src);
                    if let Some(def) = member.child_by_field_name("definition") {
                        if def.kind() == "function_definition" {
                            cls.methods.push(function(&def, src, decorators, true));
                        }
                    }
                }
                _ => {}
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
            "typed_parameter" => {
                if let Some(id) = p.named_child(0) {
                    out.push(text(&id, src).to_string());
                }
            }
            "default_parameter" | "typed_default_parameter" => {
                if let Some(name) = p.child_by_field_name("name") {
                    out.push(text(&name, src).to_string());
                }
            }
            "list_splat_pattern" => {
                if let Some(id) = p.named_child(0) {
                    out.push(format!("*{}", text(&id, src)));
                }
            }
            "dictionary_splat_pattern" => {
                if let Some(id) = p.named_child(0) {
                    out.push(format!("**{}", text(&id, src)));
                }
            }
            _ => {}
        }
    }
    out
}

fn decorator_names(decorated: &Node, src: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    for i in 0..decorated.named_child_count() {
        let Some(child) = decorated.named_child(i) else { continue };
        if child.kind() != "decorator" {
            continue;
        }
        if let Some(expr) = child.named_child(0) {
            let name = if expr.kind() == "call" {
                expr.child_by_field_name("function")
                    .map(|f| text(&f, src).to_string())
                    .unwrap_or_default()
            } else {
                text(&expr, src).to_string()
            };
            push_unique(&mut out, name);
        }
    }
    out
}

/// Name-only call sites: an identifier (or attribute) followed by a call.
fn collect_calls(node: &Node, src: &[u8], calls: &mut Vec<String>) {
    if node.kind() == "call" {
        if let Some(func) = node.child_by_field_name("function") {
            let name = match func.kind() {
                "identifier" => text(&func, src).to_string(),
                "attribute" => func
                    .child_by_field_name("attribute")
                    .map(|a| text(&a, src).to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            };
            push_unique(calls, name);
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
            for i in 0..node.named_child_count() {
                let Some(child) = node.named_child(i) else { continue };
                let module = match child.kind() {
                    "dotted_name" => Some(text(&child, src).to_string()),
                    "aliased_import" => child
                        .child_by_field_name("name")
                        .map(|n| text(&n, src).to_string()),
                    _ => None,
                };
                if let Some(module) = module {
                    imports.push(ImportStatement {
                        raw_specifier: module,
                        kind: ImportKind::Absolute,
                        imported_items: Vec::new(),
                    });
                }
            }
        }
        "import_from_statement" => {
            let module = node
                .child_by_field_name("module_name")
                .map(|m| text(&m, src).to_string())
                .unwrap_or_default();
            let kind = if module.starts_with('.') {
                ImportKind::Relative
            } else {
                ImportKind::Absolute
            };
            let mut items = Vec::new();
            let mut saw_module = false;
            for i in 0..node.named_child_count() {
                let Some(child) = node.named_child(i) else { continue };
                // First named child is the module path itself.
                if !saw_module {
                    saw_module = true;
                    continue;
                }
                match child.kind() {
                    "dotted_name" => push_unique(&mut items, text(&child, src).to_string()),
                    "aliased_import" => {
                        if let Some(name) = child.child_by_field_name("name") {
                            push_unique(&mut items, text(&name, src).to_string());
                        }
                    }
                    "wildcard_import" => push_unique(&mut items, "*".to_string()),
                    _ => {}
                }
            }
            imports.push(ImportStatement {
                raw_specifier: module,
                kind,
                imported_items: items,
            });
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
