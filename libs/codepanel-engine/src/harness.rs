/// Test Harness Generation
///
/// **Core Responsibility:**
/// Turn (candidate source, problem, example) into one runnable program that
/// calls the problem's entry point with the example's literal arguments and
/// prints the return value as JSON on stdout.
///
/// **Per-language strategy:**
/// - JavaScript: append `console.log(JSON.stringify(entry(args)))`
/// - Python: append `print(json.dumps(entry(args)))`
/// - Java: prepend a `Main` launcher class; example literals are translated
///   into Java array/scalar literals and the return value is rendered by
///   overloaded `render` helpers
///
/// The entry point comes from the problem definition, never from a literal
/// in this module.

use crate::error::HarnessError;
use codepanel_common::types::{Example, Language, Problem};

/// Build the program executed for a single example
pub fn build_program(
    problem: &Problem,
    language: Language,
    source: &str,
    example: &Example,
) -> Result<String, HarnessError> {
    let entry = &problem.harness.entry_point;

    match language {
        Language::JavaScript => Ok(format!(
            "{source}\n\n// Test case\nconst result = {entry}({args});\nconsole.log(JSON.stringify(result));\n",
            source = source,
            entry = entry,
            args = example.input,
        )),
        Language::Python => Ok(format!(
            "{source}\n\n# Test case\nimport json\nresult = {entry}({args})\nprint(json.dumps(result))\n",
            source = source,
            entry = entry,
            args = example.input,
        )),
        Language::Java => {
            let args = java_arguments(&example.input)?;
            Ok(java_program(source, &problem.harness.java_class, entry, &args))
        }
    }
}

const JAVA_RENDERERS: &str = r#"    static String render(int[] value) { return java.util.Arrays.toString(value); }
    static String render(long[] value) { return java.util.Arrays.toString(value); }
    static String render(double[] value) { return java.util.Arrays.toString(value); }
    static String render(boolean[] value) { return java.util.Arrays.toString(value); }
    static String render(char[] value) { return render(new String(value)); }
    static String render(String[] value) {
        StringBuilder out = new StringBuilder("[");
        for (int i = 0; i < value.length; i++) {
            if (i > 0) out.append(",");
            out.append(render(value[i]));
        }
        return out.append("]").toString();
    }
    static String render(String value) { return value == null ? "null" : "\"" + value + "\""; }
    static String render(Object value) { return String.valueOf(value); }
"#;

fn java_program(source: &str, class: &str, entry: &str, args: &str) -> String {
    // The launcher must be the first top-level class, after any imports
    let mut header = Vec::new();
    let mut body_start = 0;
    let lines: Vec<&str> = source.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("package ") {
            body_start = idx + 1;
        } else if trimmed.is_empty() || trimmed.starts_with("import ") {
            header.push(*line);
            body_start = idx + 1;
        } else {
            break;
        }
    }
    let body = lines[body_start..]
        .join("\n")
        .replacen(&format!("public class {}", class), &format!("class {}", class), 1);

    let mut program = String::new();
    for line in header.iter().filter(|l| !l.trim().is_empty()) {
        program.push_str(line.trim());
        program.push('\n');
    }
    program.push_str("public class Main {\n");
    program.push_str("    public static void main(String[] args) {\n");
    program.push_str(&format!(
        "        System.out.println(render(new {}().{}({})));\n",
        class, entry, args
    ));
    program.push_str("    }\n\n");
    program.push_str(JAVA_RENDERERS);
    program.push_str("}\n\n");
    program.push_str(&body);
    program.push('\n');
    program
}

/// Translate an example's literal argument list into Java expressions
///
/// Supports integers, decimals, booleans, strings, `null`, and flat arrays
/// of those. Nested arrays are rejected.
pub fn java_arguments(input: &str) -> Result<String, HarnessError> {
    let args = split_top_level(input)?
        .into_iter()
        .map(java_value)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(args.join(", "))
}

fn java_value(arg: &str) -> Result<String, HarnessError> {
    if let Some(inner) = arg.strip_prefix('[') {
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| HarnessError::Unbalanced(arg.to_string()))?;
        return java_array(arg, inner);
    }

    java_scalar(arg)
        .map(|(literal, _)| literal)
        .ok_or_else(|| HarnessError::UnsupportedArgument(arg.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarKind {
    Int,
    Long,
    Double,
    Bool,
    Str,
    Null,
}

fn java_scalar(token: &str) -> Option<(String, ScalarKind)> {
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        return Some((token.to_string(), ScalarKind::Str));
    }
    match token {
        "true" | "false" => return Some((token.to_string(), ScalarKind::Bool)),
        "null" => return Some((token.to_string(), ScalarKind::Null)),
        _ => {}
    }
    if let Ok(value) = token.parse::<i64>() {
        return if i32::try_from(value).is_ok() {
            Some((token.to_string(), ScalarKind::Int))
        } else {
            Some((format!("{}L", token), ScalarKind::Long))
        };
    }
    if token.parse::<f64>().is_ok() {
        return Some((token.to_string(), ScalarKind::Double));
    }
    None
}

fn java_array(original: &str, inner: &str) -> Result<String, HarnessError> {
    let elements = split_top_level(inner)?;
    if elements.is_empty() {
        return Ok("new int[]{}".to_string());
    }

    let mut literals = Vec::with_capacity(elements.len());
    let mut kinds = Vec::with_capacity(elements.len());
    for element in elements {
        if element.starts_with('[') {
            return Err(HarnessError::UnsupportedArgument(original.to_string()));
        }
        let (literal, kind) = java_scalar(element)
            .ok_or_else(|| HarnessError::UnsupportedArgument(original.to_string()))?;
        literals.push(literal);
        kinds.push(kind);
    }

    let element_type = if kinds.iter().all(|k| *k == ScalarKind::Int) {
        "int"
    } else if kinds.iter().all(|k| matches!(k, ScalarKind::Int | ScalarKind::Long)) {
        "long"
    } else if kinds
        .iter()
        .all(|k| matches!(k, ScalarKind::Int | ScalarKind::Long | ScalarKind::Double))
    {
        "double"
    } else if kinds.iter().all(|k| *k == ScalarKind::Bool) {
        "boolean"
    } else if kinds.iter().all(|k| matches!(k, ScalarKind::Str | ScalarKind::Null)) {
        "String"
    } else {
        return Err(HarnessError::UnsupportedArgument(original.to_string()));
    };

    // Long literals carry an `L` suffix that a double[] must not see
    if element_type == "double" {
        for literal in literals.iter_mut() {
            if let Some(stripped) = literal.strip_suffix('L') {
                *literal = stripped.to_string();
            }
        }
    }

    Ok(format!("new {}[]{{{}}}", element_type, literals.join(", ")))
}

/// Split on commas that are not nested inside brackets or string literals
fn split_top_level(input: &str) -> Result<Vec<&str>, HarnessError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (idx, ch) in trimmed.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(HarnessError::Unbalanced(input.to_string()));
                }
            }
            ',' if depth == 0 => {
                parts.push(trimmed[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }

    if depth != 0 || in_string {
        return Err(HarnessError::Unbalanced(input.to_string()));
    }
    parts.push(trimmed[start..].trim());

    if parts.iter().any(|p| p.is_empty()) {
        return Err(HarnessError::UnsupportedArgument(input.to_string()));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProblemCatalog;

    fn two_sum() -> Problem {
        ProblemCatalog::builtin().get("two-sum").unwrap().clone()
    }

    #[test]
    fn test_javascript_harness_uses_problem_entry_point() {
        let problem = ProblemCatalog::builtin().get("palindrome-number").unwrap().clone();
        let program = build_program(
            &problem,
            Language::JavaScript,
            "function isPalindrome(x) { return true; }",
            &problem.examples[0],
        )
        .unwrap();

        assert!(program.starts_with("function isPalindrome(x) { return true; }"));
        assert!(program.contains("const result = isPalindrome(121);"));
        assert!(program.contains("console.log(JSON.stringify(result));"));
        assert!(!program.contains("twoSum"));
    }

    #[test]
    fn test_python_harness_prints_json() {
        let problem = two_sum();
        let program = build_program(
            &problem,
            Language::Python,
            "def twoSum(nums, target):\n    return [0, 1]",
            &problem.examples[0],
        )
        .unwrap();

        assert!(program.contains("result = twoSum([2,7,11,15],9)"));
        assert!(program.contains("import json"));
        assert!(program.ends_with("print(json.dumps(result))\n"));
    }

    #[test]
    fn test_java_harness_places_launcher_after_imports() {
        let problem = two_sum();
        let source = "import java.util.*;\n\npublic class Solution {\n    public int[] twoSum(int[] nums, int target) { return new int[]{0, 1}; }\n}";

        let program = build_program(&problem, Language::Java, source, &problem.examples[0]).unwrap();

        let import_at = program.find("import java.util.*;").unwrap();
        let main_at = program.find("public class Main").unwrap();
        let solution_at = program.find("class Solution").unwrap();
        assert!(import_at < main_at && main_at < solution_at);
        assert!(program.contains("render(new Solution().twoSum(new int[]{2, 7, 11, 15}, 9))"));
        assert!(!program.contains("public class Solution"));
    }

    #[test]
    fn test_java_arguments_scalars_and_arrays() {
        assert_eq!(java_arguments("[2,7,11,15],9").unwrap(), "new int[]{2, 7, 11, 15}, 9");
        assert_eq!(java_arguments("\"a,b\"").unwrap(), "\"a,b\"");
        assert_eq!(java_arguments("-121").unwrap(), "-121");
        assert_eq!(java_arguments("[\"x\", \"y\"]").unwrap(), "new String[]{\"x\", \"y\"}");
        assert_eq!(java_arguments("[true,false]").unwrap(), "new boolean[]{true, false}");
        assert_eq!(java_arguments("[1, 2.5]").unwrap(), "new double[]{1, 2.5}");
        assert_eq!(java_arguments("3000000000").unwrap(), "3000000000L");
        assert_eq!(java_arguments("[]").unwrap(), "new int[]{}");
        assert_eq!(java_arguments("").unwrap(), "");
    }

    #[test]
    fn test_java_arguments_rejects_unsupported_shapes() {
        assert!(matches!(
            java_arguments("[[1,2],[3]]"),
            Err(HarnessError::UnsupportedArgument(_))
        ));
        assert!(matches!(java_arguments("[1,2"), Err(HarnessError::Unbalanced(_))));
        assert!(matches!(
            java_arguments("{\"a\": 1}"),
            Err(HarnessError::UnsupportedArgument(_))
        ));
        assert!(matches!(java_arguments("1,,2"), Err(HarnessError::UnsupportedArgument(_))));
    }

    #[test]
    fn test_split_respects_escaped_quotes() {
        let parts = split_top_level(r#""say \"hi\", ok",2"#).unwrap();
        assert_eq!(parts, vec![r#""say \"hi\", ok""#, "2"]);
    }
}
