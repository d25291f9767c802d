//! Prompt templates for the judge
//!
//! The system context pins down what each command kind does so the judge
//! does not infer side effects. Answer formats put the explanation before the
//! answer; the judge reasons first and commits last.

use crate::maneuver::Solution;
use crate::policy::Policy;

/// Facts about the command kinds, sent as the system message
pub const COMMAND_CONTEXT: &str = r#"
You are an assistant to an Air Traffic Controller.

Do not guess. Only use the facts.

# Facts
- The "heading" command changes the direction of the aircraft. "heading" does not modify the speed nor the altitude.
- The "altitude" command changes the altitude of the aircraft. "altitude" does not modify the speed nor the direction.
- The "speed" command changes the speed of the aircraft. "speed" does not modify the altitude nor the direction.
"#;

const SORTING_CONTEXT_RULES: &str = r#"
# Core rules
{policy}
"#;

const FILTER_TEMPLATE: &str = r#"
You need to make sure that no core rule is violated by the following solution.

# Solution
```json
{solution}
```

# Core rules
{policy}

# Answer format
```json
{
    "Explanation": "[One sentence explanation based on rules and solution]",
    "Answer": "[yes/no]"
}
```

# Inquiry
Does the provided solution violate one of the core rules?

Answer the inquiry in JSON in code block.
"#;

const SORTING_TEMPLATE: &str = r#"
You will encounter some core rules that you need to always satisfy when choosing the correct solution for the ATCO.
The rules express preference over different options.
The order of the rules does matter.
Always try to satisfy the first rule. If the first rule is not applicable, use the second.

# Solution 1
```json
{solution_1}
```

# Solution 2
```json
{solution_2}
```

# Accepted answer format
```json
{
    "Explanation": "[One sentence explanation based on rules]",
    "Answer": "[Solution 1/Solution 2]"
}
```

It is required to always provide a definite answer (solution 1 or solution 2) otherwise the program fails.
If both solutions are equal with respect to the core rules, any of the two solutions can be chosen.

# Inquiry
Based on the core rules, which solution is preferred?

Answer the inquiry in JSON in code block.
"#;

/// System message for filtering
pub fn filtering_context() -> &'static str {
    COMMAND_CONTEXT
}

/// User message asking whether `solution` breaks a filtering rule
pub fn filtering_prompt(solution: &Solution, rendered_rules: &str) -> String {
    // Rules go in last so a rule quoting `{solution}` stays literal.
    FILTER_TEMPLATE
        .replace("{solution}", &solution.commands_prompt_block())
        .replace("{policy}", rendered_rules)
}

/// System message for sorting: command facts plus the ordered preferences
pub fn sorting_context(policy: &Policy) -> String {
    let rules = SORTING_CONTEXT_RULES.replace("{policy}", &policy.render_sorting_rules());
    format!("{}{}", COMMAND_CONTEXT, rules)
}

/// User message asking which of two solutions is preferred
pub fn sorting_prompt(first: &Solution, second: &Solution) -> String {
    SORTING_TEMPLATE
        .replace("{solution_1}", &first.commands_prompt_block())
        .replace("{solution_2}", &second.commands_prompt_block())
}
