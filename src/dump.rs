use std::fmt::Write;

use crate::document::loader::LoadReport;
use crate::env::resolver::resolve_blocks;

/// Plain-text listing of every document's variables and resolved templates,
/// for `--dump`. Unsendable templates are listed with their error.
pub fn render(report: &LoadReport) -> String {
    let mut out = String::new();
    for document in &report.documents {
        let _ = writeln!(out, "### {}", document.path.display());
        let resolution = resolve_blocks(&document.blocks);

        for (name, value) in resolution.variables.iter() {
            let _ = writeln!(out, "# @{name}={value}");
        }

        for (block, template) in document.blocks.iter().zip(&resolution.templates) {
            out.push('\n');
            match template {
                Ok(template) => {
                    if let Some(name) = &template.name {
                        let _ = writeln!(out, "&{name}");
                    }
                    out.push_str(&template.to_http());
                    if let Some(path) = &template.postscript {
                        let _ = writeln!(out, "@postscript {}", path.display());
                    }
                }
                Err(err) => {
                    let _ = writeln!(out, "# unsendable (line {}): {err}", block.line);
                }
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::document::Document;
    use crate::document::parser::parse_document;

    #[test]
    fn test_dump_lists_variables_and_templates() {
        let text = "\
@host=example.com
&ping
GET https://{{host}}/ping
Accept: */*

POST https://{{host}}/{{nope}}
";
        let report = LoadReport {
            documents: vec![Document {
                path: PathBuf::from("api.http"),
                blocks: parse_document(text).unwrap(),
            }],
            failures: vec![],
        };

        insta::assert_snapshot!(render(&report).trim_end(), @r"
        ### api.http
        # @host=example.com

        &ping
        GET https://example.com/ping HTTP/1.1
        Accept: */*

        # unsendable (line 6): undefined variable 'nope' in POST https://{{host}}/{{nope}} (line 6)
        ");
    }
}
