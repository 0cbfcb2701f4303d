//! Reply texts sent back to the operator.

use std::net::Ipv4Addr;

use pagecount_inventory::{InventoryError, Lookup, PrinterRecord};
use pagecount_snmp::PageCount;

use super::command::{CommandName, ParseError};
use super::failures::FailureSummary;

pub(crate) const NOT_RECOGNISED: &str =
    "Comando não reconhecido. Use /comandos para ver a lista de comandos.";
pub(crate) const EMPTY_INVENTORY: &str = "Nenhuma impressora cadastrada.";
pub(crate) const NO_FAILURES: &str = "Nenhuma falha registrada.";

pub(crate) fn start() -> String {
    String::from(concat!(
        "Olá! Envie \"/contadores\" para executar a busca por contadores das impressoras. ",
        "Use /comandos para ver todos os comandos."
    ))
}

pub(crate) fn help() -> String {
    let mut text = String::from("Comandos disponíveis:");
    for name in CommandName::ALL {
        text.push('\n');
        text.push_str(name.usage());
        text.push_str(" - ");
        text.push_str(name.description());
    }
    text
}

pub(crate) fn counter(record: &PrinterRecord, count: PageCount) -> String {
    format!("{record} - Contador: {count}")
}

pub(crate) fn counter_failure(record: &PrinterRecord) -> String {
    format!("Erro ao obter o contador da impressora em {record}")
}

pub(crate) fn not_found(lookup: &Lookup) -> String {
    format!("{lookup} não encontrado.")
}

pub(crate) fn parse_failure(error: &ParseError) -> String {
    let Some(command) = error.command() else {
        return NOT_RECOGNISED.to_owned();
    };
    let detail = match error {
        ParseError::MissingField { field, .. } => format!("informe {field}"),
        ParseError::InvalidAddress { value, .. } => {
            format!("'{value}' não é um endereço IP válido")
        }
        ParseError::InvalidAssetId { value, .. } => format!("'{value}' não é um NID válido"),
        ParseError::EmptyText { field, .. } => format!("{field} não pode ficar vazio"),
        ParseError::Empty | ParseError::NotACommand | ParseError::UnknownCommand { .. } => {
            return NOT_RECOGNISED.to_owned();
        }
    };
    format!("Comando inválido: {detail}. Use '{}'.", command.usage())
}

pub(crate) fn inventory_rejection(error: &InventoryError) -> String {
    match error {
        InventoryError::NotFound { lookup } => not_found(lookup),
        InventoryError::AddressTaken { address } => {
            format!("Já existe uma impressora com o IP {address}.")
        }
        InventoryError::AssetIdTaken { asset_id, address } => {
            format!("O NID {asset_id} já pertence à impressora em {address}.")
        }
        other => fault(other),
    }
}

pub(crate) fn fault(error: &dyn std::error::Error) -> String {
    format!("Ocorreu um erro: {error}")
}

pub(crate) fn added(record: &PrinterRecord) -> String {
    format!("Impressora adicionada: {record}")
}

pub(crate) fn asset_id_changed(record: &PrinterRecord) -> String {
    format!("NID atualizado: {record}")
}

pub(crate) fn moved(record: &PrinterRecord) -> String {
    format!("IP atualizado: {record}")
}

pub(crate) fn relabelled(record: &PrinterRecord) -> String {
    format!("Setor atualizado: {record}")
}

pub(crate) fn removed(record: &PrinterRecord) -> String {
    format!("Impressora removida: {record}")
}

pub(crate) fn search_results(text: &str, matches: &[&PrinterRecord]) -> String {
    if matches.is_empty() {
        return format!("Nenhuma impressora encontrada para \"{text}\".");
    }
    let lines: Vec<String> = matches.iter().map(ToString::to_string).collect();
    lines.join("\n")
}

pub(crate) fn failures<'a>(
    entries: impl IntoIterator<Item = (FailureSummary, Option<&'a PrinterRecord>)>,
) -> String {
    let mut text = String::from("Impressoras com erro:");
    for (summary, record) in entries {
        text.push('\n');
        match record {
            Some(record) => text.push_str(&record.to_string()),
            None => text.push_str(&removed_printer(summary.address)),
        }
        text.push_str(&format!(" - {} falha(s)", summary.failures));
    }
    text
}

fn removed_printer(address: Ipv4Addr) -> String {
    format!("{address} (não consta mais no inventário)")
}
