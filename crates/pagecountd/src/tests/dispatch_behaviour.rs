//! End-to-end command handling against an in-memory inventory.

use std::net::Ipv4Addr;

use rstest::{fixture, rstest};

use crate::dispatch::DispatchOutcome;

use super::support::{DispatchHarness, ScriptedFetcher, asset, record};

#[fixture]
fn harness() -> DispatchHarness {
    DispatchHarness::new(
        vec![
            record([10, 0, 0, 1], "Contabilidade", "100"),
            record([10, 0, 0, 5], "Recepção", "200"),
            record([10, 0, 0, 9], "Almoxarifado", "300"),
        ],
        ScriptedFetcher::default()
            .with([10, 0, 0, 1], 48_213)
            .with([10, 0, 0, 5], 1_200),
    )
}

#[rstest]
fn counters_report_every_printer_in_address_order(mut harness: DispatchHarness) {
    let (outcome, replies) = harness.send("/contadores");

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(
        replies,
        vec![
            "Contabilidade (10.0.0.1, NID: 100) - Contador: 48213",
            "Recepção (10.0.0.5, NID: 200) - Contador: 1200",
            "Erro ao obter o contador da impressora em Almoxarifado (10.0.0.9, NID: 300)",
        ]
    );
}

#[rstest]
fn failed_reads_are_listed_by_buscar_erro(mut harness: DispatchHarness) {
    let (_, before) = harness.send("/buscarErro");
    assert_eq!(before, vec!["Nenhuma falha registrada."]);

    harness.send("/contadores");
    harness.send("/contador ip:10.0.0.9");
    let (outcome, replies) = harness.send("/buscarErro");

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(
        replies,
        vec!["Impressoras com erro:\nAlmoxarifado (10.0.0.9, NID: 300) - 2 falha(s)"]
    );
}

#[rstest]
fn failures_outlive_the_printer_they_belong_to(mut harness: DispatchHarness) {
    harness.send("/contadores");
    harness.send("/remover NID:300");

    let (_, replies) = harness.send("/buscarErro");

    assert_eq!(
        replies,
        vec!["Impressoras com erro:\n10.0.0.9 (não consta mais no inventário) - 1 falha(s)"]
    );
}

#[rstest]
fn moving_a_printer_rekeys_it(mut harness: DispatchHarness) {
    let (outcome, replies) = harness.send("/atualizarIP NID:100 PARA:10.0.0.2");

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(
        replies,
        vec!["IP atualizado: Contabilidade (10.0.0.2, NID: 100)"]
    );
    let inventory = harness.dispatcher.inventory();
    assert!(inventory.get(Ipv4Addr::new(10, 0, 0, 1)).is_none());
    assert_eq!(
        inventory
            .get(Ipv4Addr::new(10, 0, 0, 2))
            .map(|printer| printer.asset_id().clone()),
        Some(asset("100"))
    );
    assert!(
        harness
            .storage
            .stored()
            .iter()
            .any(|printer| printer.address() == Ipv4Addr::new(10, 0, 0, 2)),
        "the move should be persisted"
    );
}

#[rstest]
fn adding_a_duplicate_address_is_rejected(mut harness: DispatchHarness) {
    let (first, replies) = harness.send("/adicionar NID:400 IP:10.0.0.3 SETOR:Warehouse");
    assert_eq!(first, DispatchOutcome::Completed);
    assert_eq!(
        replies,
        vec!["Impressora adicionada: Warehouse (10.0.0.3, NID: 400)"]
    );

    let (second, replies) = harness.send("/adicionar NID:500 IP:10.0.0.3 SETOR:Warehouse");
    assert_eq!(second, DispatchOutcome::Rejected);
    assert_eq!(replies, vec!["Já existe uma impressora com o IP 10.0.0.3."]);
    assert_eq!(harness.dispatcher.inventory().len(), 4);
}

#[rstest]
fn adding_a_duplicate_asset_id_is_rejected(mut harness: DispatchHarness) {
    let (outcome, replies) = harness.send("/adicionar NID:200 IP:10.0.0.3 SETOR:Warehouse");

    assert_eq!(outcome, DispatchOutcome::Rejected);
    assert_eq!(
        replies,
        vec!["O NID 200 já pertence à impressora em 10.0.0.5."]
    );
}

#[rstest]
fn counter_prefers_the_address_when_both_are_given(mut harness: DispatchHarness) {
    let (outcome, replies) = harness.send("/contador NID:100 ip:10.0.0.5");

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(
        replies,
        vec!["Recepção (10.0.0.5, NID: 200) - Contador: 1200"]
    );
}

#[rstest]
#[case::address("/contador ip:10.9.9.9", "IP 10.9.9.9 não encontrado.")]
#[case::asset_id("/contador NID:999", "NID 999 não encontrado.")]
#[case::removal("/remover NID:999", "NID 999 não encontrado.")]
fn unknown_printers_are_rejected(
    mut harness: DispatchHarness,
    #[case] text: &str,
    #[case] expected: &str,
) {
    let (outcome, replies) = harness.send(text);

    assert_eq!(outcome, DispatchOutcome::Rejected);
    assert_eq!(replies, vec![expected]);
}

#[rstest]
#[case::unknown_command("/imprimir")]
#[case::plain_chat("bom dia")]
fn unrecognised_messages_point_to_the_help(mut harness: DispatchHarness, #[case] text: &str) {
    let (outcome, replies) = harness.send(text);

    assert_eq!(outcome, DispatchOutcome::Rejected);
    assert_eq!(
        replies,
        vec!["Comando não reconhecido. Use /comandos para ver a lista de comandos."]
    );
}

#[rstest]
fn malformed_arguments_quote_the_usage(mut harness: DispatchHarness) {
    let (outcome, replies) = harness.send("/atualizarIP NID:100 PARA:10.0.0");

    assert_eq!(outcome, DispatchOutcome::Rejected);
    assert_eq!(
        replies,
        vec![
            "Comando inválido: '10.0.0' não é um endereço IP válido. \
             Use '/atualizarIP NID:<NID> PARA:<novo IP>'."
        ]
    );
}

#[rstest]
fn persistence_faults_fail_the_command_and_keep_state(mut harness: DispatchHarness) {
    harness.storage.fail_next_store();

    let (outcome, replies) = harness.send("/atualizarSetor NID:100 PARA:Financeiro");

    assert_eq!(outcome, DispatchOutcome::Failed);
    assert_eq!(replies.len(), 1);
    assert!(
        replies
            .first()
            .is_some_and(|reply| reply.starts_with("Ocorreu um erro: ")),
        "unexpected replies: {replies:?}"
    );
    let unchanged = harness
        .dispatcher
        .inventory()
        .get(Ipv4Addr::new(10, 0, 0, 1))
        .map(|printer| printer.label().to_owned());
    assert_eq!(unchanged.as_deref(), Some("Contabilidade"));
}

#[rstest]
fn relabel_accepts_multi_word_sectors(mut harness: DispatchHarness) {
    let (outcome, replies) = harness.send("/atualizarSetor NID:300 PARA:Sala de Reuniões 2");

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(
        replies,
        vec!["Setor atualizado: Sala de Reuniões 2 (10.0.0.9, NID: 300)"]
    );
}

#[rstest]
fn search_matches_labels_case_insensitively(mut harness: DispatchHarness) {
    let (_, replies) = harness.send("/buscar RECEP");
    assert_eq!(replies, vec!["Recepção (10.0.0.5, NID: 200)"]);

    let (_, replies) = harness.send("/buscar cozinha");
    assert_eq!(
        replies,
        vec!["Nenhuma impressora encontrada para \"cozinha\"."]
    );
}

#[rstest]
fn renaming_an_asset_id_keeps_the_printer(mut harness: DispatchHarness) {
    let (outcome, replies) = harness.send("/atualizarNID NID:300 PARA:301");

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(
        replies,
        vec!["NID atualizado: Almoxarifado (10.0.0.9, NID: 301)"]
    );
    assert!(
        harness
            .dispatcher
            .inventory()
            .find_by_asset_id(&asset("300"))
            .is_none()
    );
}

#[rstest]
fn an_empty_inventory_is_reported_by_contadores() {
    let mut harness = DispatchHarness::new(Vec::new(), ScriptedFetcher::default());

    let (outcome, replies) = harness.send("/contadores");

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(replies, vec!["Nenhuma impressora cadastrada."]);
}

#[rstest]
fn repeating_an_addition_keeps_a_single_record() {
    let mut harness = DispatchHarness::new(Vec::new(), ScriptedFetcher::default());
    let text = "/adicionar NID:200 IP:10.0.0.3 SETOR:Warehouse";

    let (first, _) = harness.send(text);
    let (second, replies) = harness.send(text);

    assert_eq!(first, DispatchOutcome::Completed);
    assert_eq!(second, DispatchOutcome::Rejected);
    assert_eq!(replies, vec!["Já existe uma impressora com o IP 10.0.0.3."]);
    let inventory = harness.dispatcher.inventory();
    assert_eq!(inventory.len(), 1);
    assert_eq!(
        inventory
            .get(Ipv4Addr::new(10, 0, 0, 3))
            .map(|record| record.label()),
        Some("Warehouse")
    );
}

#[rstest]
fn help_lists_every_command(mut harness: DispatchHarness) {
    let (_, replies) = harness.send("/comandos");
    let help = replies.first().expect("one reply");

    assert!(help.starts_with("Comandos disponíveis:"));
    for usage in ["/contadores", "/atualizarIP", "/buscarErro", "/remover"] {
        assert!(help.contains(usage), "help is missing {usage}");
    }
}
