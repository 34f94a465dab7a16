// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use super::*;
use awssig_aws_v4::canonical::canonical_uri;
use awssig_aws_v4::Payload;
use http::Method;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use pretty_assertions::assert_eq;

const SPECIAL_KEY: &str = "!@#$%^&*()_+-=;:'><,/?.txt";

#[test]
fn test_canonical_uri_with_special_characters() {
    assert_eq!(
        canonical_uri(&format!("/{SPECIAL_KEY}")).expect("path must be valid"),
        "/%21%40%23%24%25%5E%26%2A%28%29_%2B-%3D%3B%3A%27%3E%3C%2C/%3F.txt"
    );
}

#[test]
fn test_head_object_with_special_characters() {
    let signer = init_signing_test();
    let decoded = example_request(Method::HEAD, &format!("/{SPECIAL_KEY}"));

    // The same object addressed through an encoded uri.
    let req = http::Request::head(format!(
        "https://{HOST}/{}",
        utf8_percent_encode(SPECIAL_KEY, NON_ALPHANUMERIC)
    ))
    .body(())
    .expect("request must be valid");
    let (parts, _) = req.into_parts();
    let encoded =
        RequestDescriptor::from_parts(&parts, Payload::default()).expect("parts must convert");
    assert_eq!(encoded.path, decoded.path);

    assert_eq!(
        signer
            .sign_header(&decoded, &example_credential(), example_time())
            .expect("sign must succeed"),
        signer
            .sign_header(&encoded, &example_credential(), example_time())
            .expect("sign must succeed"),
    );
}

#[test]
fn test_presigned_url_with_encoded_characters() {
    let signer = init_signing_test();
    let req = example_request(Method::GET, "/photos/My Trip/100%.jpg");

    let url = signer
        .sign_presigned_url(&req, &example_credential(), example_time(), 60)
        .expect("presign must succeed");
    assert!(url.starts_with(
        "https://examplebucket.s3.amazonaws.com/photos/My%20Trip/100%25.jpg?X-Amz-Algorithm="
    ));

    // The rendered url must be a valid uri that decodes back to the key.
    let uri: http::Uri = url.parse().expect("url must be valid");
    assert_eq!(
        percent_encoding::percent_decode_str(uri.path())
            .decode_utf8()
            .expect("path must be utf-8"),
        "/photos/My Trip/100%.jpg"
    );
}

#[test]
fn test_unicode_object_key() {
    let signer = init_signing_test();
    let req = example_request(Method::GET, "/文件/données.txt");

    let url = signer
        .sign_presigned_url(&req, &example_credential(), example_time(), 60)
        .expect("presign must succeed");
    assert!(url.starts_with(
        "https://examplebucket.s3.amazonaws.com/%E6%96%87%E4%BB%B6/donn%C3%A9es.txt?"
    ));
}

#[test]
fn test_query_with_reserved_characters() {
    let signer = init_signing_test();
    let mut a = example_request(Method::GET, "/");
    a.query_push("prefix", "CI/");
    a.query_push("delimiter", "/");
    a.query_push("start-after", "a b&c=d");

    let req = http::Request::get(format!(
        "https://{HOST}/?start-after=a%20b%26c%3Dd&delimiter=%2F&prefix=CI%2F"
    ))
    .body(())
    .expect("request must be valid");
    let (parts, _) = req.into_parts();
    let b = RequestDescriptor::from_parts(&parts, Payload::default()).expect("parts must convert");

    assert_eq!(
        signer
            .sign_header(&a, &example_credential(), example_time())
            .expect("sign must succeed"),
        signer
            .sign_header(&b, &example_credential(), example_time())
            .expect("sign must succeed"),
    );
}
