//! Rust structure extraction via AST traversal.
//!
//! Structs and enums are modeled as classes; `impl` blocks attach their
//! functions as methods of the matching type. Trait impls attach to the
//! implementing type as well.

use tree_sitter::Node;

use super::{has_token, line_range, push_unique, text, Extraction};
use crate::parser::types::{Class, Function, ImportKind, ImportStatement, MethodKind};

pub fn extract(root: &Node, src: &[u8]) -> Extraction {
    let mut out = Extraction::default();

    collect_imports(root, src, &mut out.imports);

    let mut impls: Vec<(String, Vec<Function>, usize, usize)> = Vec::new();

    for i in 0..root.named_child_count() {
        let Some(node) = root.named_child(i) else { continue };
        match node.kind() {
            "function_item" => out.functions.push(function(&node, src, false)),
            "struct_item" | "enum_item" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| text(&n, src).to_string())
                    .unwrap_or_default();
                let (line_start, line_end) = line_range(&node);
                out.classes.push(Class::new(name, line_start, line_end));
            }
            "impl_item" => {
                if let Some((type_name, methods)) = impl_block(&node, src) {
                    let (line_start, line_end) = line_range(&node);
                    impls.push((type_name, methods, line_start, line_end));
                }
            }
            _ => {}
        }
    }

    // Attach impl methods to their type; impls for types defined elsewhere
    // still get a class entry so the methods are not lost.
    for (type_name, methods, line_start, line_end) in impls {
        if let Some(class) = out.classes.iter_mut().find(|c| c.name == type_name) {
            class.methods.extend(methods);
        } else {
            let mut class = Class::new(type_name, line_start, line_end);
            class.methods = methods;
            out.classes.push(class);
        }
    }

    out
}

fn function(node: &Node, src: &[u8], method: bool) -> Function {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(&n, src).to_string())
        .unwrap_or_default();
    let (line_start, line_end) = line_range(node);
    let mut func = Function::new(name, line_start, line_end);
    func.is_async = has_token(node, "async");

    let mut has_self = false;
    if let Some(params) = node.child_by_field_name("parameters") {
        for i in 0..params.named_child_count() {
            let Some(p) = params.named_child(i) else { continue };
            match p.kind() {
                "parameter" => {
                    if let Some(pattern) = p.child_by_field_name("pattern") {
                        func.parameters.push(text(&pattern, src).to_string());
                    }
                }
                "self_parameter" => {
                    has_self = true;
                    func.parameters.push("self".to_string());
                }
                _ => {}
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        collect_calls(&body, src, &mut func.calls);
    }

    if method {
        func.method_kind = Some(if has_self {
            MethodKind::Instance
        } else {
            MethodKind::Static
        });
    }
    func
}

fn impl_block(node: &Node, src: &[u8]) -> Option<(String, Vec<Function>)> {
    let type_node = node.child_by_field_name("type")?;
    // `impl Config<T>` names the base type.
    let type_name = if type_node.kind() == "generic_type" {
        type_node
            .child_by_field_name("type")
            .map(|t| text(&t, src).to_string())?
    } else {
        text(&type_node, src).to_string()
    };

    let mut methods = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        for i in 0..body.named_child_count() {
            let Some(member) = body.named_child(i) else { continue };
            if member.kind() == "function_item" {
                methods.push(function(&member, src, true));
            }
        }
    }
    Some((type_name, methods))
}

fn collect_calls(node: &Node, src: &[u8], calls: &mut Vec<String>) {
    if node.kind() == "call_expression" {
        if let Some(func) = node.child_by_field_name("function") {
            let name = match func.kind() {
                "identifier" => text(&func, src).to_string(),
                "field_expression" => func
                    .child_by_field_name("field")
                    .map(|f| text(&f, src).to_string())
                    .unwrap_or_default(),
                "scoped_identifier" => func
                    .child_by_field_name("name")
                    .map(|n| text(&n, src).to_string())
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
    if node.kind() == "use_declaration" {
        if let Some(argument) = node.child_by_field_name("argument") {
            imports.push(use_statement(&argument, src));
        }
        return;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_imports(&child, src, imports);
        }
    }
}

fn use_statement(argument: &Node, src: &[u8]) -> ImportStatement {
    match argument.kind() {
        "scoped_use_list" => {
            let path = argument
                .child_by_field_name("path")
                .map(|p| text(&p, src).to_string())
                .unwrap_or_default();
            let mut items = Vec::new();
            if let Some(list) = argument.child_by_field_name("list") {
                for i in 0..list.named_child_count() {
                    if let Some(item) = list.named_child(i) {
                        push_unique(&mut items, text(&item, src).to_string());
                    }
                }
            }
            ImportStatement {
                raw_specifier: path,
                kind: ImportKind::Absolute,
                imported_items: items,
            }
        }
        "use_wildcard" => {
            let path = argument
                .named_child(0)
                .map(|p| text(&p, src).to_string())
                .unwrap_or_default();
            ImportStatement {
                raw_specifier: path,
                kind: ImportKind::Absolute,
                imported_items: vec!["*".to_string()],
            }
        }
        "use_as_clause" => {
            let path = argument
                .child_by_field_name("path")
                .map(|p| text(&p, src).to_string())
                .unwrap_or_default();
            let items = path
                .rsplit("::")
                .next()
                .map(|seg| vec![seg.to_string()])
                .unwrap_or_default();
            ImportStatement {
                raw_specifier: path,
                kind: ImportKind::Absolute,
                imported_items: items,
            }
        }
        _ => {
            let path = text(argument, src).to_string();
            let items = path
                .rsplit("::")
                .next()
                .filter(|seg| *seg != path)
                .map(|seg| vec![seg.to_string()])
                .unwrap_or_default();
            ImportStatement {
                raw_specifier: path,
                kind: ImportKind::Absolute,
                imported_items: items,
            }
        }
    }
}
