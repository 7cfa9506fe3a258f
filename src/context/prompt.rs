use super::types::RetrievedPassage;

/// Fixed instruction text placed at the top of every system message.
pub const SYSTEM_INSTRUCTIONS: &str = concat!(
    "Você é um assistente útil que responde perguntas com base nos documentos fornecidos.\n",
    "Use apenas as informações dos documentos para responder. ",
    "Se a informação não estiver nos documentos, diga que não tem essa informação.\n",
    "\n",
    "Formatação das respostas:\n",
    "1. Quando listar itens numerados, coloque cada item em uma linha separada, SEM linhas em branco entre os itens.\n",
    "2. Se um item numerado tiver subitens com bullets, coloque-os logo abaixo do item principal.\n",
    "3. Use markdown para destacar informações importantes: **negrito**, *itálico*, etc.\n",
    "4. Separe parágrafos principais com linhas em branco, mas NÃO coloque linhas em branco entre itens numerados.\n",
    "5. Coloque uma linha em branco apenas antes do último parágrafo conclusivo.",
);

pub const CONTEXT_HEADER: &str = "Contexto dos documentos:";

/// Reply used when retrieval comes back empty and the policy short-circuits.
pub const NO_CONTEXT_REPLY: &str = "Desculpe, não consegui encontrar informações relevantes para responder à sua pergunta. Poderia reformular ou fazer outra pergunta?";

/// Formats passages as labeled blocks, in the order given, separated by a blank line.
pub fn format_passages(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .map(|passage| {
            format!(
                "Document from {} (relevance: {:.2}):\n{}",
                passage.source, passage.score, passage.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn system_prompt(context: &str) -> String {
    format!("{}\n\n{}\n\n{}", SYSTEM_INSTRUCTIONS, CONTEXT_HEADER, context)
}

/// Splits a system prompt back into its context section.
pub fn context_section(system_prompt: &str) -> Option<&str> {
    let marker = format!("{}\n\n", CONTEXT_HEADER);
    system_prompt
        .find(&marker)
        .map(|idx| &system_prompt[idx + marker.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passages_are_labeled_with_source_and_two_decimal_score() {
        let passages = vec![
            RetrievedPassage::new("Horário: 9h às 18h.", "guia_institucional.pdf", 0.8765),
            RetrievedPassage::new("Missões comerciais anuais.", "informe_anual.pdf", 0.5),
        ];

        let context = format_passages(&passages);

        assert_eq!(
            context,
            "Document from guia_institucional.pdf (relevance: 0.88):\nHorário: 9h às 18h.\n\n\
             Document from informe_anual.pdf (relevance: 0.50):\nMissões comerciais anuais."
        );
    }

    #[test]
    fn instructions_carry_formatting_rules() {
        assert!(SYSTEM_INSTRUCTIONS.contains("SEM linhas em branco entre os itens"));
        assert!(SYSTEM_INSTRUCTIONS.contains("logo abaixo do item principal"));
        assert!(SYSTEM_INSTRUCTIONS.contains("**negrito**, *itálico*"));
        assert!(SYSTEM_INSTRUCTIONS.contains("antes do último parágrafo conclusivo"));
    }

    #[test]
    fn context_section_round_trips() {
        let prompt = system_prompt("Document from a.pdf (relevance: 1.00):\ntexto");
        assert!(prompt.starts_with(SYSTEM_INSTRUCTIONS));
        assert_eq!(
            context_section(&prompt),
            Some("Document from a.pdf (relevance: 1.00):\ntexto")
        );
        assert_eq!(context_section(&system_prompt("")), Some(""));
    }
}
