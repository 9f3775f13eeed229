// ABOUTME: Compiled-in deployment profiles pinning one image tag per service.
// ABOUTME: Each profile is a complete, tested tag-set for the whole stack.

use super::{PortSpec, RunSpec, ServiceDefinition, ServiceKind};
use crate::probe::ProbePolicy;
use crate::types::ImageRef;
use std::fmt;

const DB_IMAGE: &str = "postgres:13.3";
const BROKER_IMAGE: &str = "alfresco/alfresco-activemq:5.16.4-jre11-centos7";
const TRANSFORM_IMAGE: &str = "alfresco/alfresco-transform-core-aio:2.5.7";
const REPOSITORY_IMAGE: &str = "alfresco/alfresco-content-repository-community:7.2.0";
const SEARCH_IMAGE: &str = "alfresco/alfresco-search-services:2.0.3";
const WEB_APP_IMAGE: &str = "alfresco/alfresco-content-app:2.9.0";
const PROXY_IMAGE: &str = "alfresco/alfresco-acs-nginx:3.4.2";

const MIB: u64 = 1024 * 1024;

/// A deployable version of the whole stack.
///
/// Profiles are compiled in; the CLI parses the profile name and rejects
/// unknown ones before anything else runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Community 7.2 generation images.
    Community72,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Community72 => "community-7.2",
        }
    }

    /// Engine architectures this profile's images are published for.
    pub fn supported_architectures(&self) -> &'static [&'static str] {
        match self {
            Profile::Community72 => &["x86_64", "amd64"],
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn image(reference: &str) -> ImageRef {
    ImageRef::parse(reference).expect("profile image tags are valid references")
}

fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Service definitions for a profile, in catalog order.
pub(super) fn definitions(profile: Profile) -> Vec<ServiceDefinition> {
    match profile {
        Profile::Community72 => community_72(),
    }
}

fn community_72() -> Vec<ServiceDefinition> {
    vec![
        ServiceDefinition {
            kind: ServiceKind::Db,
            image: image(DB_IMAGE),
            run: RunSpec {
                env: env(&[
                    ("POSTGRES_PASSWORD", "alfresco"),
                    ("POSTGRES_USER", "alfresco"),
                    ("POSTGRES_DB", "alfresco"),
                ]),
                memory_bytes: 768 * MIB,
                port: Some(PortSpec {
                    host_port: 5432,
                    container_port: 5432,
                }),
                command: Some(
                    [
                        "postgres",
                        "-c",
                        "max_connections=200",
                        "-c",
                        "logging_collector=on",
                        "-c",
                        "log_min_messages=LOG",
                        "-c",
                        "log_directory=/var/log/postgresql",
                    ]
                    .map(str::to_string)
                    .to_vec(),
                ),
            },
            start_group: 0,
            probe: ProbePolicy::query(&["psql", "-U", "alfresco", "-c", "select 1 where false"]),
        },
        ServiceDefinition {
            kind: ServiceKind::Broker,
            image: image(BROKER_IMAGE),
            run: RunSpec {
                env: Vec::new(),
                memory_bytes: 768 * MIB,
                port: Some(PortSpec {
                    host_port: 8161,
                    container_port: 8161,
                }),
                command: None,
            },
            start_group: 0,
            probe: ProbePolicy::http(
                "bash",
                "curl -u admin:admin -L -s -o /dev/null --max-time 1 -w \"%{http_code}\" http://localhost:8161",
            ),
        },
        ServiceDefinition {
            kind: ServiceKind::Transform,
            image: image(TRANSFORM_IMAGE),
            run: RunSpec {
                env: env(&[(
                    "JAVA_OPTS",
                    "-XX:MinRAMPercentage=50 -XX:MaxRAMPercentage=80 \
                     -Dserver.tomcat.threads.max=12 -Dserver.tomcat.threads.min=4 \
                     -Dlogging.level.org.alfresco.transform.router.TransformerDebug=ERROR",
                )]),
                memory_bytes: 1536 * MIB,
                port: None,
                command: None,
            },
            start_group: 1,
            probe: ProbePolicy::http(
                "bash",
                "curl -s -o /dev/null --max-time 1 -w \"%{http_code}\" http://localhost:8090",
            ),
        },
        ServiceDefinition {
            kind: ServiceKind::Search,
            image: image(SEARCH_IMAGE),
            run: RunSpec {
                env: env(&[
                    ("SOLR_ALFRESCO_HOST", "repository"),
                    ("SOLR_ALFRESCO_PORT", "8080"),
                    ("SOLR_SOLR_HOST", "search"),
                    ("SOLR_SOLR_PORT", "8983"),
                    ("SOLR_CREATE_ALFRESCO_DEFAULTS", "alfresco,archive"),
                    ("ALFRESCO_SECURE_COMMS", "secret"),
                    ("JAVA_TOOL_OPTIONS", "-Dalfresco.secureComms.secret=secret"),
                ]),
                memory_bytes: 1024 * MIB,
                port: Some(PortSpec {
                    host_port: 8083,
                    container_port: 8983,
                }),
                command: None,
            },
            start_group: 1,
            probe: ProbePolicy::http(
                "bash",
                "curl -s -L -o /dev/null --max-time 1 -w \"%{http_code}\" \
                 --header \"X-Alfresco-Search-Secret:secret\" http://localhost:8983/solr",
            ),
        },
        ServiceDefinition {
            kind: ServiceKind::Repository,
            image: image(REPOSITORY_IMAGE),
            run: RunSpec {
                env: env(&[
                    (
                        "JAVA_TOOL_OPTIONS",
                        "-Dencryption.keystore.type=JCEKS \
                         -Dencryption.cipherAlgorithm=DESede/CBC/PKCS5Padding \
                         -Dencryption.keyAlgorithm=DESede \
                         -Dencryption.keystore.location=/usr/local/tomcat/shared/classes/alfresco/extension/keystore/keystore \
                         -Dmetadata-keystore.password=mp6yc0UD9e \
                         -Dmetadata-keystore.aliases=metadata \
                         -Dmetadata-keystore.metadata.password=oKIWzVdEdA \
                         -Dmetadata-keystore.metadata.algorithm=DESede",
                    ),
                    (
                        "JAVA_OPTS",
                        "-Ddb.driver=org.postgresql.Driver -Ddb.username=alfresco \
                         -Ddb.password=alfresco -Ddb.url=jdbc:postgresql://db:5432/alfresco \
                         -Dsolr.host=search -Dsolr.port=8983 -Dsolr.http.connection.timeout=1000 \
                         -Dsolr.secureComms=secret -Dsolr.sharedSecret=secret \
                         -Dsolr.base.url=/solr -Dindex.subsystem.name=solr6 \
                         -Dshare.host=127.0.0.1 -Dshare.port=8080 \
                         -Dalfresco.host=localhost -Dalfresco.port=8080 \
                         -Daos.baseUrlOverwrite=http://localhost:8080/alfresco/aos \
                         -Dmessaging.broker.url='failover:(nio://broker:61616)?timeout=3000&jms.useCompression=true' \
                         -Ddeployment.method=DOCKER_COMPOSE \
                         -DlocalTransform.core-aio.url=http://transform:8090/ \
                         -Dcsrf.filter.enabled=false \
                         -XX:MinRAMPercentage=50 -XX:MaxRAMPercentage=80",
                    ),
                ]),
                memory_bytes: 3328 * MIB,
                port: None,
                command: None,
            },
            start_group: 2,
            probe: ProbePolicy::http(
                "bash",
                "curl -s -o /dev/null --max-time 1 -w \"%{http_code}\" \
                 http://localhost:8080/alfresco/s/api/server",
            ),
        },
        ServiceDefinition {
            kind: ServiceKind::WebApp,
            image: image(WEB_APP_IMAGE),
            run: RunSpec {
                env: Vec::new(),
                memory_bytes: 256 * MIB,
                port: None,
                command: None,
            },
            start_group: 3,
            probe: ProbePolicy::http(
                "sh",
                "curl -s -o /dev/null --max-time 1 -w \"%{http_code}\" http://localhost:8080/",
            ),
        },
        ServiceDefinition {
            kind: ServiceKind::Proxy,
            image: image(PROXY_IMAGE),
            run: RunSpec {
                env: env(&[
                    ("DISABLE_PROMETHEUS", "true"),
                    ("DISABLE_SYNCSERVICE", "true"),
                    ("DISABLE_ADW", "true"),
                    ("DISABLE_CONTROL_CENTER", "true"),
                    ("DISABLE_SHARE", "true"),
                    ("ENABLE_CONTENT_APP", "true"),
                ]),
                memory_bytes: 128 * MIB,
                port: Some(PortSpec {
                    host_port: 8080,
                    container_port: 8080,
                }),
                command: None,
            },
            start_group: 4,
            probe: ProbePolicy::http(
                "sh",
                "curl -s -o /dev/null --max-time 1 -w \"%{http_code}\" http://localhost:8080/content-app/",
            ),
        },
    ]
}
