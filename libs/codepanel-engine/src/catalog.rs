/// Problem Catalog - Static Registry of Coding Problems
///
/// Problems are defined at deployment time (built in, or loaded from a JSON
/// file) and never mutated afterwards. Lookups are by question id.

use anyhow::{Context, Result, bail};
use codepanel_common::types::{Difficulty, Example, Harness, Language, Problem};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ProblemCatalog {
    problems: Vec<Problem>,
}

impl ProblemCatalog {
    /// Build a catalog, rejecting duplicate ids and problems that cannot be tested
    pub fn new(problems: Vec<Problem>) -> Result<Self> {
        if problems.is_empty() {
            bail!("Problem catalog is empty");
        }

        let mut seen = HashSet::new();
        for problem in &problems {
            if !seen.insert(problem.id.as_str()) {
                bail!("Duplicate problem id '{}'", problem.id);
            }
            if problem.examples.is_empty() {
                bail!("Problem '{}' has no examples", problem.id);
            }
            if problem.starter_code.is_empty() {
                bail!("Problem '{}' has no starter code", problem.id);
            }
            if problem.harness.entry_point.trim().is_empty() {
                bail!("Problem '{}' has no harness entry point", problem.id);
            }
        }

        Ok(Self { problems })
    }

    /// Load problems from a JSON array file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read problem catalog {}", path.display()))?;
        let problems: Vec<Problem> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse problem catalog {}", path.display()))?;

        Self::new(problems)
    }

    pub fn builtin() -> Self {
        Self {
            problems: builtin_problems(),
        }
    }

    pub fn get(&self, question_id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == question_id)
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// First problem, shown to the interviewer before anything is picked
    pub fn default_problem(&self) -> &Problem {
        &self.problems[0]
    }
}

fn starter(entries: [(Language, &str); 3]) -> BTreeMap<Language, String> {
    entries
        .into_iter()
        .map(|(language, code)| (language, code.to_string()))
        .collect()
}

fn example(input: &str, output: &str, explanation: Option<&str>) -> Example {
    Example {
        input: input.to_string(),
        output: output.to_string(),
        explanation: explanation.map(str::to_string),
    }
}

fn builtin_problems() -> Vec<Problem> {
    vec![
        Problem {
            id: "two-sum".to_string(),
            title: "Two Sum".to_string(),
            difficulty: Difficulty::Easy,
            description: "Given an array of integers `nums` and an integer `target`, return indices of the two numbers in the array such that they add up to `target`.\n\nYou may assume that each input would have exactly one solution, and you may not use the same element twice.\n\nYou can return the answer in any order.".to_string(),
            constraints: vec![
                "2 ≤ nums.length ≤ 10⁴".to_string(),
                "-10⁹ ≤ nums[i] ≤ 10⁹".to_string(),
                "-10⁹ ≤ target ≤ 10⁹".to_string(),
                "Only one valid answer exists".to_string(),
            ],
            examples: vec![
                example("[2,7,11,15],9", "[0,1]", Some("Because nums[0] + nums[1] == 9, we return [0, 1]")),
                example("[3,2,4],6", "[1,2]", None),
                example("[3,3],6", "[0,1]", None),
            ],
            starter_code: starter([
                (
                    Language::JavaScript,
                    "function twoSum(nums, target) {\n  // Write your solution here\n  \n}",
                ),
                (
                    Language::Python,
                    "def twoSum(nums, target):\n    # Write your solution here\n    pass",
                ),
                (
                    Language::Java,
                    "class Solution {\n    public int[] twoSum(int[] nums, int target) {\n        // Write your solution here\n        \n    }\n}",
                ),
            ]),
            harness: Harness {
                entry_point: "twoSum".to_string(),
                java_class: "Solution".to_string(),
            },
        },
        Problem {
            id: "reverse-string".to_string(),
            title: "Reverse String".to_string(),
            difficulty: Difficulty::Easy,
            description: "Write a function that reverses a string and returns the result.".to_string(),
            constraints: vec![
                "1 ≤ s.length ≤ 10⁵".to_string(),
                "s consists of printable ASCII characters".to_string(),
            ],
            examples: vec![
                example("\"hello\"", "\"olleh\"", None),
                example("\"Hannah\"", "\"hannaH\"", None),
            ],
            starter_code: starter([
                (
                    Language::JavaScript,
                    "function reverseString(s) {\n  // Write your solution here\n  \n}",
                ),
                (
                    Language::Python,
                    "def reverseString(s):\n    # Write your solution here\n    pass",
                ),
                (
                    Language::Java,
                    "class Solution {\n    public String reverseString(String s) {\n        // Write your solution here\n        \n    }\n}",
                ),
            ]),
            harness: Harness {
                entry_point: "reverseString".to_string(),
                java_class: "Solution".to_string(),
            },
        },
        Problem {
            id: "palindrome-number".to_string(),
            title: "Palindrome Number".to_string(),
            difficulty: Difficulty::Easy,
            description: "Given an integer `x`, return `true` if `x` is a palindrome, and `false` otherwise.\n\nAn integer is a palindrome when it reads the same forward and backward.".to_string(),
            constraints: vec!["-2³¹ ≤ x ≤ 2³¹ - 1".to_string()],
            examples: vec![
                example("121", "true", Some("121 reads as 121 from left to right and from right to left")),
                example("-121", "false", Some("From left to right, it reads -121. From right to left, it becomes 121-")),
                example("10", "false", Some("Reads 01 from right to left")),
            ],
            starter_code: starter([
                (
                    Language::JavaScript,
                    "function isPalindrome(x) {\n  // Write your solution here\n  \n}",
                ),
                (
                    Language::Python,
                    "def isPalindrome(x):\n    # Write your solution here\n    pass",
                ),
                (
                    Language::Java,
                    "class Solution {\n    public boolean isPalindrome(int x) {\n        // Write your solution here\n        \n    }\n}",
                ),
            ]),
            harness: Harness {
                entry_point: "isPalindrome".to_string(),
                java_class: "Solution".to_string(),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let builtin = ProblemCatalog::builtin();
        let validated = ProblemCatalog::new(builtin.problems().to_vec());
        assert!(validated.is_ok());

        for problem in builtin.problems() {
            for language in Language::ALL {
                assert!(problem.supports(language), "{} lacks {}", problem.id, language);
            }
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let catalog = ProblemCatalog::builtin();
        let problem = catalog.get("two-sum").unwrap();
        assert_eq!(problem.title, "Two Sum");
        assert_eq!(problem.examples[0].input, "[2,7,11,15],9");
        assert!(catalog.get("three-sum").is_none());
        assert_eq!(catalog.default_problem().id, "two-sum");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let two_sum = ProblemCatalog::builtin().get("two-sum").unwrap().clone();
        let result = ProblemCatalog::new(vec![two_sum.clone(), two_sum]);
        assert!(result.is_err());
    }

    #[test]
    fn test_problem_without_examples_rejected() {
        let mut problem = ProblemCatalog::builtin().get("two-sum").unwrap().clone();
        problem.examples.clear();
        assert!(ProblemCatalog::new(vec![problem]).is_err());
    }

    #[test]
    fn test_load_from_json_file() {
        let problems = ProblemCatalog::builtin().problems()[..1].to_vec();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&problems).unwrap().as_bytes())
            .unwrap();

        let catalog = ProblemCatalog::load(file.path()).unwrap();

        assert_eq!(catalog.problems().len(), 1);
        assert_eq!(catalog.get("two-sum").unwrap(), &problems[0]);
    }
}
