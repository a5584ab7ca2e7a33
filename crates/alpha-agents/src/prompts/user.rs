//! User message templates

/// One analyst turn: the request, gathered data, gaps, answer format
pub const ANALYSIS: &str = "\
{{ request }}

Your task: {{ task }}

=== DATA FOR {{ ticker }} ===
{% for section in sections %}
--- {{ section.tool }} ---
{{ section.text }}
{% endfor %}
{%- for gap in gaps %}
DATA GAP: {{ gap.tool }}: {{ gap.error }}
{%- endfor %}

Based on your analysis, provide a clear BUY or SELL recommendation.

Consider:
- Your risk tolerance profile: {{ risk_profile }}
- Maximum acceptable volatility: {{ max_volatility_pct }}%
- Your specialized perspective ({{ perspective }})

Provide your recommendation in this format:
RECOMMENDATION: [BUY or SELL]
CONFIDENCE: [HIGH/MEDIUM/LOW]
REASONING: [2-3 sentences explaining your decision]";

/// Opening request for a collaboration run
pub const COLLABORATION: &str = "\
Please perform a comprehensive stock analysis of {{ ticker }} for a {{ risk_label | lower }} investor.

Each analyst should:
1. Review the data gathered by your specialized tools
2. Perform your analysis from your perspective
3. Provide insights and a recommendation

Fundamental Analyst: Analyze the company's 10-K filing and financial metrics.
Sentiment Analyst: Analyze recent news and market sentiment.
Valuation Analyst: Analyze price trends, volatility, and returns.";

/// Opening request for a debate
pub const DEBATE: &str = "\
The investment committee needs to decide whether to BUY or SELL {{ ticker }}.

Each analyst must:
1. Conduct your specialized analysis using the data provided
2. Provide a clear BUY or SELL recommendation with reasoning
3. Respond to other analysts' perspectives
4. Work towards consensus

Risk Profile: {{ risk_profile }}

Consensus is reached when at least {{ threshold }} of 3 analysts agree on BUY or SELL. \
The debate ends after {{ max_rounds }} rounds without consensus.";
