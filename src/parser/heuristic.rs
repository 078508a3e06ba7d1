//! Heuristic-strategy extraction: line-by-line regex scanning.
//!
//! Serves languages without a bundled grammar (Go, Java, Ruby, C#).
//! Best-effort by design: declaration boundaries are approximated from
//! where the next declaration starts, and call extraction is a plain
//! identifier-before-parenthesis match. Reduced fidelity never marks a
//! file as failed.

use std::sync::OnceLock;

use regex::Regex;

use super::grammar::Extraction;
use super::language::Language;
use super::types::{Class, Function, ImportKind, ImportStatement, MethodKind};

pub fn extract(language: Language, source: &str) -> Extraction {
    match language {
        Language::Go => scan_go(source),
        Language::Java => scan_braced(source, java_import(), java_class(), java_method()),
        Language::CSharp => scan_braced(source, csharp_import(), csharp_class(), csharp_method()),
        Language::Ruby => scan_ruby(source),
        _ => Extraction::default(),
    }
}

// ─── Pattern constructors ───────────────────────────────────────────────

fn go_import_single() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^import\s+(?:\w+\s+)?"([^"]+)""#).unwrap())
}

fn go_import_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*(?:\w+\s+)?"([^"]+)"\s*$"#).unwrap())
}

fn go_func() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^func\s+(?:\(\s*\w+\s+\*?(\w+)\s*\)\s+)?(\w+)\s*\(([^)]*)").unwrap()
    })
}

fn go_type() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^type\s+(\w+)\s+(?:struct|interface)\b").unwrap())
}

fn java_import() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^import\s+(?:static\s+)?([\w.]+(?:\.\*)?)\s*;").unwrap())
}

fn java_class() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:public\s+|protected\s+|private\s+)?(?:abstract\s+|final\s+|static\s+)*(?:class|interface|enum)\s+(\w+)(?:\s+extends\s+([\w.<>]+))?",
        )
        .unwrap()
    })
}

fn java_method() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s+(?:public\s+|protected\s+|private\s+)(?:(static)\s+)?(?:final\s+|synchronized\s+|abstract\s+)*[\w<>\[\],.\s]+\s+(\w+)\s*\(([^)]*)",
        )
        .unwrap()
    })
}

fn csharp_import() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^using\s+(?:static\s+)?([\w.]+)\s*;").unwrap())
}

fn csharp_class() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:public\s+|internal\s+|private\s+|protected\s+)?(?:abstract\s+|sealed\s+|static\s+|partial\s+)*(?:class|interface|struct|record)\s+(\w+)(?:\s*:\s*([\w.,\s<>]+))?",
        )
        .unwrap()
    })
}

fn csharp_method() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s+(?:public\s+|internal\s+|private\s+|protected\s+)(?:(static)\s+)?(?:async\s+|virtual\s+|override\s+|sealed\s+)*[\w<>\[\],.\s]+\s+(\w+)\s*\(([^)]*)",
        )
        .unwrap()
    })
}

fn ruby_require() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*require(_relative)?\s+['"]([^'"]+)['"]"#).unwrap()
    })
}

fn ruby_def() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\s*)def\s+(?:self\.)?([\w?!]+)(?:\s*\(([^)]*)\))?").unwrap()
    })
}

fn ruby_class() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)class\s+(\w+)(?:\s*<\s*([\w:]+))?").unwrap())
}

fn call_site() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap())
}

/// Control-flow keywords that look like calls to the call-site regex.
const CALL_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "switch", "match", "return", "catch", "new", "throw",
    "func", "def", "fn", "until", "unless", "using", "lock", "foreach", "defer", "go",
    "typeof", "sizeof", "nameof",
];

// ─── Shared scanning machinery ──────────────────────────────────────────

/// Tracks the declaration currently being filled so later lines can
/// contribute calls and close its line range.
enum Open {
    None,
    Function(Function),
    Method(Function),
}

struct Scanner {
    out: Extraction,
    open: Open,
    current_class: Option<Class>,
}

impl Scanner {
    fn new() -> Self {
        Self {
            out: Extraction::default(),
            open: Open::None,
            current_class: None,
        }
    }

    fn add_calls(&mut self, line: &str) {
        let func = match &mut self.open {
            Open::Function(f) | Open::Method(f) => f,
            Open::None => return,
        };
        for cap in call_site().captures_iter(line) {
            let name = &cap[1];
            if !CALL_KEYWORDS.contains(&name) && !func.calls.iter().any(|c| c == name) {
                func.calls.push(name.to_string());
            }
        }
    }

    /// Close the open declaration at `line` (1-based, inclusive).
    fn close_open(&mut self, line: usize) {
        match std::mem::replace(&mut self.open, Open::None) {
            Open::None => {}
            Open::Function(mut f) => {
                f.line_end = f.line_end.max(line);
                self.out.functions.push(f);
            }
            Open::Method(mut f) => {
                f.line_end = f.line_end.max(line);
                match &mut self.current_class {
                    Some(class) => class.methods.push(f),
                    None => self.out.functions.push(f),
                }
            }
        }
    }

    fn close_class(&mut self, line: usize) {
        self.close_open(line);
        if let Some(mut class) = self.current_class.take() {
            let methods_end = class.methods.iter().map(|m| m.line_end).max().unwrap_or(0);
            class.line_end = class.line_start.max(methods_end).max(line);
            self.out.classes.push(class);
        }
    }

    fn finish(mut self, last_line: usize) -> Extraction {
        self.close_class(last_line);
        self.out
    }
}

/// Where the parameter name sits relative to its type annotation.
#[derive(Clone, Copy)]
enum ParamName {
    /// `name Type` (Go) or bare names (Ruby).
    First,
    /// `Type name` (Java, C#).
    Last,
}

fn split_params(raw: &str, position: ParamName) -> Vec<String> {
    raw.split(',')
        .map(|p| {
            let p = p.trim();
            let p = p.split(':').next().unwrap_or(p).trim();
            let token = match position {
                ParamName::First => p.split_whitespace().next(),
                ParamName::Last => p.split_whitespace().last(),
            };
            token.unwrap_or("").to_string()
        })
        .filter(|p| !p.is_empty())
        .collect()
}

// ─── Go ─────────────────────────────────────────────────────────────────

fn scan_go(source: &str) -> Extraction {
    let mut scanner = Scanner::new();
    let mut in_import_block = false;
    let mut line_count = 0;

    for (idx, line) in source.lines().enumerate() {
        let lineno = idx + 1;
        line_count = lineno;

        if in_import_block {
            if line.trim_start().starts_with(')') {
                in_import_block = false;
            } else if let Some(cap) = go_import_line().captures(line) {
                scanner.out.imports.push(ImportStatement {
                    raw_specifier: cap[1].to_string(),
                    kind: ImportKind::Absolute,
                    imported_items: Vec::new(),
                });
            }
            continue;
        }
        if line.trim_start().starts_with("import (") || line.trim() == "import (" {
            in_import_block = true;
            continue;
        }
        if let Some(cap) = go_import_single().captures(line) {
            scanner.out.imports.push(ImportStatement {
                raw_specifier: cap[1].to_string(),
                kind: ImportKind::Absolute,
                imported_items: Vec::new(),
            });
            continue;
        }

        if let Some(cap) = go_type().captures(line) {
            scanner.close_class(lineno.saturating_sub(1));
            scanner.current_class = Some(Class::new(cap[1].to_string(), lineno, lineno));
            continue;
        }

        if let Some(cap) = go_func().captures(line) {
            scanner.close_open(lineno.saturating_sub(1));
            let receiver = cap.get(1).map(|m| m.as_str().to_string());
            let mut func = Function::new(cap[2].to_string(), lineno, lineno);
            func.parameters = split_params(&cap[3], ParamName::First);
            if receiver.is_some() {
                func.method_kind = Some(MethodKind::Instance);
                // Methods attach to the receiver type when we have seen it.
                let target = receiver.as_deref();
                if scanner.current_class.as_ref().map(|c| c.name.as_str()) != target {
                    scanner.close_class(lineno.saturating_sub(1));
                    if let Some(class) = scanner
                        .out
                        .classes
                        .iter()
                        .position(|c| Some(c.name.as_str()) == target)
                    {
                        scanner.current_class = Some(scanner.out.classes.remove(class));
                    }
                }
                scanner.open = Open::Method(func);
            } else {
                scanner.close_class(lineno.saturating_sub(1));
                scanner.open = Open::Function(func);
            }
            continue;
        }

        scanner.add_calls(line);
    }

    scanner.finish(line_count)
}

// ─── Java / C# (brace languages share a scan) ───────────────────────────

fn scan_braced(
    source: &str,
    import_re: &Regex,
    class_re: &Regex,
    method_re: &Regex,
) -> Extraction {
    let mut scanner = Scanner::new();
    let mut line_count = 0;

    for (idx, line) in source.lines().enumerate() {
        let lineno = idx + 1;
        line_count = lineno;

        if let Some(cap) = import_re.captures(line) {
            let spec = cap[1].to_string();
            let items = if spec.ends_with(".*") {
                vec!["*".to_string()]
            } else {
                Vec::new()
            };
            let raw = spec.trim_end_matches(".*").trim_end_matches('.').to_string();
            scanner.out.imports.push(ImportStatement {
                raw_specifier: raw,
                kind: ImportKind::Absolute,
                imported_items: items,
            });
            continue;
        }

        if let Some(cap) = class_re.captures(line) {
            scanner.close_class(lineno.saturating_sub(1));
            let mut class = Class::new(cap[1].to_string(), lineno, lineno);
            if let Some(bases) = cap.get(2) {
                class.bases = bases
                    .as_str()
                    .split(',')
                    .map(|b| b.trim().to_string())
                    .filter(|b| !b.is_empty())
                    .collect();
            }
            scanner.current_class = Some(class);
            continue;
        }

        if scanner.current_class.is_some() {
            if let Some(cap) = method_re.captures(line) {
                scanner.close_open(lineno.saturating_sub(1));
                let mut func = Function::new(cap[2].to_string(), lineno, lineno);
                func.parameters = split_params(&cap[3], ParamName::Last);
                func.method_kind = Some(if cap.get(1).is_some() {
                    MethodKind::Static
                } else {
                    MethodKind::Instance
                });
                func.is_async = line.contains("async ");
                scanner.open = Open::Method(func);
                continue;
            }
        }

        scanner.add_calls(line);
    }

    scanner.finish(line_count)
}

// ─── Ruby ───────────────────────────────────────────────────────────────

fn scan_ruby(source: &str) -> Extraction {
    let mut scanner = Scanner::new();
    let mut line_count = 0;
    let mut class_indent = 0usize;

    for (idx, line) in source.lines().enumerate() {
        let lineno = idx + 1;
        line_count = lineno;

        if let Some(cap) = ruby_require().captures(line) {
            let kind = if cap.get(1).is_some() {
                ImportKind::Relative
            } else {
                ImportKind::Require
            };
            scanner.out.imports.push(ImportStatement {
                raw_specifier: cap[2].to_string(),
                kind,
                imported_items: Vec::new(),
            });
            continue;
        }

        if let Some(cap) = ruby_class().captures(line) {
            scanner.close_class(lineno.saturating_sub(1));
            class_indent = cap[1].len();
            let mut class = Class::new(cap[2].to_string(), lineno, lineno);
            if let Some(base) = cap.get(3) {
                class.bases.push(base.as_str().to_string());
            }
            scanner.current_class = Some(class);
            continue;
        }

        if let Some(cap) = ruby_def().captures(line) {
            scanner.close_open(lineno.saturating_sub(1));
            let indent = cap[1].len();
            let mut func = Function::new(cap[2].to_string(), lineno, lineno);
            if let Some(params) = cap.get(3) {
                func.parameters = split_params(params.as_str(), ParamName::First);
            }
            let is_singleton = line.contains("def self.");
            if scanner.current_class.is_some() && indent > class_indent {
                func.method_kind = Some(if is_singleton {
                    MethodKind::Static
                } else {
                    MethodKind::Instance
                });
                scanner.open = Open::Method(func);
            } else {
                scanner.close_class(lineno.saturating_sub(1));
                scanner.open = Open::Function(func);
            }
            continue;
        }

        scanner.add_calls(line);
    }

    scanner.finish(line_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_imports_and_functions() {
        let source = r#"package server

import (
    "fmt"
    "net/http"
    log "github.com/sirupsen/logrus"
)

import "strings"

type Server struct {
    addr string
}

func (s *Server) Start() error {
    log.Info("starting")
    return listen(s.addr)
}

func NewServer(addr string, opts ...Option) *Server {
    validate(addr)
    return &Server{addr: addr}
}
"#;
        let ext = extract(Language::Go, source);

        let specs: Vec<&str> = ext.imports.iter().map(|i| i.raw_specifier.as_str()).collect();
        assert_eq!(specs, vec!["fmt", "net/http", "github.com/sirupsen/logrus", "strings"]);

        assert_eq!(ext.classes.len(), 1);
        assert_eq!(ext.classes[0].name, "Server");
        assert_eq!(ext.classes[0].methods.len(), 1);
        assert_eq!(ext.classes[0].methods[0].name, "Start");
        assert!(ext.classes[0].methods[0].calls.contains(&"listen".to_string()));

        assert_eq!(ext.functions.len(), 1);
        assert_eq!(ext.functions[0].name, "NewServer");
        assert_eq!(ext.functions[0].calls, vec!["validate"]);
    }

    #[test]
    fn test_java_class_and_methods() {
        let source = r#"package com.example.app;

import java.util.List;
import java.util.concurrent.*;

public class UserService extends BaseService {
    private final Repository repo;

    public List<User> findAll(int limit) {
        return repo.query(limit);
    }

    public static UserService create() {
        return new UserService();
    }
}
"#;
        let ext = extract(Language::Java, source);

        assert_eq!(ext.imports.len(), 2);
        assert_eq!(ext.imports[0].raw_specifier, "java.util.List");
        assert_eq!(ext.imports[1].raw_specifier, "java.util.concurrent");
        assert_eq!(ext.imports[1].imported_items, vec!["*"]);

        assert_eq!(ext.classes.len(), 1);
        let cls = &ext.classes[0];
        assert_eq!(cls.name, "UserService");
        assert_eq!(cls.bases, vec!["BaseService"]);
        assert_eq!(cls.methods.len(), 2);
        assert_eq!(cls.methods[0].name, "findAll");
        assert_eq!(cls.methods[0].method_kind, Some(MethodKind::Instance));
        assert_eq!(cls.methods[1].method_kind, Some(MethodKind::Static));
    }

    #[test]
    fn test_ruby_requires_and_defs() {
        let source = r#"require 'json'
require_relative 'helpers/format'

class Exporter < Base
  def export(records)
    serialize(records)
  end

  def self.default
    new
  end
end

def standalone
  puts "ok"
end
"#;
        let ext = extract(Language::Ruby, source);

        assert_eq!(ext.imports.len(), 2);
        assert_eq!(ext.imports[0].kind, ImportKind::Require);
        assert_eq!(ext.imports[1].kind, ImportKind::Relative);
        assert_eq!(ext.imports[1].raw_specifier, "helpers/format");

        assert_eq!(ext.classes.len(), 1);
        let cls = &ext.classes[0];
        assert_eq!(cls.name, "Exporter");
        assert_eq!(cls.bases, vec!["Base"]);
        assert_eq!(cls.methods.len(), 2);
        assert_eq!(cls.methods[0].calls, vec!["serialize"]);
        assert_eq!(cls.methods[1].method_kind, Some(MethodKind::Static));

        assert_eq!(ext.functions.len(), 1);
        assert_eq!(ext.functions[0].name, "standalone");
    }

    #[test]
    fn test_csharp_usings_and_class() {
        let source = r#"using System;
using System.Collections.Generic;

namespace App.Services
{
    public class OrderService : IOrderService
    {
        public void Submit(Order order)
        {
            Validate(order);
        }
    }
}
"#;
        let ext = extract(Language::CSharp, source);

        assert_eq!(ext.imports.len(), 2);
        assert_eq!(ext.imports[1].raw_specifier, "System.Collections.Generic");

        assert_eq!(ext.classes.len(), 1);
        assert_eq!(ext.classes[0].name, "OrderService");
        assert_eq!(ext.classes[0].bases, vec!["IOrderService"]);
        assert_eq!(ext.classes[0].methods.len(), 1);
        assert!(ext.classes[0].methods[0].calls.contains(&"Validate".to_string()));
    }
}
